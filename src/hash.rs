//! Seed, field kinds, and the per-type digest strategy registry.

use core::fmt;
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::record::RecordLayout;

/// Per-map randomization value fed into every digest.
///
/// A fixed `(seed, key)` pair always produces the same digest; that is what
/// keeps a key's shard assignment stable for a map instance's lifetime.
/// Fresh maps draw a random seed so adversarial key sets cannot be aimed at
/// a single shard across processes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seed(u64);

impl Seed {
    /// Draws a fresh seed from the process's randomized hasher state.
    pub fn random() -> Self {
        Seed(RandomState::new().hash_one(0x5eed_u64))
    }

    /// Builds a reproducible seed, e.g. for tests or stable routing across
    /// restarts.
    pub fn from_u64(value: u64) -> Self {
        Seed(value)
    }
}

/// Seeded digest of a byte run, truncated to the 32-bit digest width used
/// throughout the crate.
#[inline]
pub(crate) fn bytes_digest(seed: Seed, bytes: &[u8]) -> u32 {
    xxh3_64_with_seed(bytes, seed.0) as u32
}

/// Primitive kinds a digest routine exists for.
///
/// These are the kinds a [`RecordLayout`] can hash; anything else
/// (containers, indirections, trait objects) has no builder method and
/// therefore never contributes to a digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    U128,
    I128,
    Usize,
    Isize,
    F32,
    F64,
    Char,
    Str,
}

/// Self-hashing capability for key types that can digest themselves.
///
/// When a type offers both this and a record layout, implementors of
/// [`HashKey`] should prefer [`KeyHasher::self_hash`]; it skips field
/// walking entirely.
pub trait Hashable {
    /// Digest `self` under `seed`. Must be deterministic for a fixed
    /// `(seed, value)` pair and must agree with `Eq`: equal values produce
    /// equal digests.
    fn digest(&self, seed: Seed) -> u32;
}

/// Key types with a canonical digest strategy.
///
/// `SplitMap::new` and the other derived constructors resolve the strategy
/// through this trait exactly once, at construction. Provided for the
/// primitive scalar types, `char`, `String`, and `&'static str`; user key
/// types implement it by delegating to one of the [`KeyHasher`]
/// constructors. The explicit `with_hasher` constructors bypass the trait.
pub trait HashKey: Eq {
    /// The strategy used when a map is built without an explicit hasher.
    fn hasher() -> KeyHasher<Self>
    where
        Self: Sized;
}

/// A digest strategy for `K`, resolved once and applied per call with a
/// single dispatch branch.
pub struct KeyHasher<K> {
    strategy: Strategy<K>,
}

enum Strategy<K> {
    Primitive(FieldKind, fn(Seed, &K) -> u32),
    SelfHash(fn(Seed, &K) -> u32),
    Textual(fn(Seed, &K) -> u32),
    Record(RecordLayout<K>),
}

impl<K> KeyHasher<K> {
    pub(crate) fn primitive(kind: FieldKind, digest: fn(Seed, &K) -> u32) -> Self {
        Self {
            strategy: Strategy::Primitive(kind, digest),
        }
    }

    /// Strategy that defers to the type's own [`Hashable`] capability.
    pub fn self_hash() -> Self
    where
        K: Hashable,
    {
        Self {
            strategy: Strategy::SelfHash(|seed, key| key.digest(seed)),
        }
    }

    /// Strategy that renders the key with `Display` and hashes the text.
    ///
    /// Degraded path: one string allocation per digest and a collision rate
    /// bounded by the rendering, not the value. For types with no better
    /// option.
    pub fn textual() -> Self
    where
        K: fmt::Display,
    {
        Self {
            strategy: Strategy::Textual(|seed, key| {
                bytes_digest(seed, key.to_string().as_bytes())
            }),
        }
    }

    /// Strategy that walks a prebuilt [`RecordLayout`] over composite keys.
    pub fn record(layout: RecordLayout<K>) -> Self {
        Self {
            strategy: Strategy::Record(layout),
        }
    }

    /// Digest `key` under `seed`.
    #[inline]
    pub fn digest(&self, seed: Seed, key: &K) -> u32 {
        match &self.strategy {
            Strategy::Primitive(_, digest) => digest(seed, key),
            Strategy::SelfHash(digest) => digest(seed, key),
            Strategy::Textual(digest) => digest(seed, key),
            Strategy::Record(layout) => layout.digest(seed, key),
        }
    }
}

// Manual impls: deriving would demand `K: Clone`/`K: Debug`, which the
// strategies never need.
impl<K> Clone for KeyHasher<K> {
    fn clone(&self) -> Self {
        let strategy = match &self.strategy {
            Strategy::Primitive(kind, digest) => Strategy::Primitive(*kind, *digest),
            Strategy::SelfHash(digest) => Strategy::SelfHash(*digest),
            Strategy::Textual(digest) => Strategy::Textual(*digest),
            Strategy::Record(layout) => Strategy::Record(layout.clone()),
        };
        Self { strategy }
    }
}

impl<K> fmt::Debug for KeyHasher<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.strategy {
            Strategy::Primitive(kind, _) => f.debug_tuple("Primitive").field(kind).finish(),
            Strategy::SelfHash(_) => f.write_str("SelfHash"),
            Strategy::Textual(_) => f.write_str("Textual"),
            Strategy::Record(layout) => f.debug_tuple("Record").field(layout).finish(),
        }
    }
}

macro_rules! impl_hash_key_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl HashKey for $ty {
                fn hasher() -> KeyHasher<Self> {
                    KeyHasher::primitive(FieldKind::$kind, |seed, key| {
                        bytes_digest(seed, &key.to_le_bytes())
                    })
                }
            }
        )*
    };
}

impl_hash_key_scalar! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    u128 => U128,
    i128 => I128,
    usize => Usize,
    isize => Isize,
}

impl HashKey for bool {
    fn hasher() -> KeyHasher<Self> {
        KeyHasher::primitive(FieldKind::Bool, |seed, key| bytes_digest(seed, &[*key as u8]))
    }
}

impl HashKey for char {
    fn hasher() -> KeyHasher<Self> {
        KeyHasher::primitive(FieldKind::Char, |seed, key| {
            bytes_digest(seed, &(*key as u32).to_le_bytes())
        })
    }
}

impl HashKey for String {
    fn hasher() -> KeyHasher<Self> {
        KeyHasher::primitive(FieldKind::Str, |seed, key| bytes_digest(seed, key.as_bytes()))
    }
}

impl HashKey for &'static str {
    fn hasher() -> KeyHasher<Self> {
        KeyHasher::primitive(FieldKind::Str, |seed, key| bytes_digest(seed, key.as_bytes()))
    }
}
