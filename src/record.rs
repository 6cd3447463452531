//! Field-accessor layouts for digesting composite record keys.

use core::fmt;
use std::sync::Arc;

use crate::hash::{bytes_digest, FieldKind, Seed};

struct Field<K> {
    kind: FieldKind,
    digest: Arc<dyn Fn(Seed, &K) -> u32 + Send + Sync>,
}

/// An ordered list of field accessors describing how to digest a record
/// key `K`.
///
/// Each builder call appends one accessor for a supported primitive field;
/// [`record`](RecordLayout::record) splices in a nested record's accessors,
/// pre-composed with the outer getter, so nesting costs nothing at digest
/// time. Fields with no builder method (containers, indirections) simply
/// never join the layout: two keys differing only in such fields digest
/// identically and are then separated by `Eq` inside a shard.
///
/// Field digests combine in declaration order, so reordering builder calls
/// changes the result. An empty layout is legal and digests every key to
/// the same value.
///
/// ```
/// use splitmap::{HashKey, KeyHasher, RecordLayout, SplitMap};
///
/// #[derive(Clone, PartialEq, Eq)]
/// struct Endpoint {
///     host: String,
///     port: u16,
/// }
///
/// impl HashKey for Endpoint {
///     fn hasher() -> KeyHasher<Self> {
///         KeyHasher::record(
///             RecordLayout::new()
///                 .str(|e: &Endpoint| e.host.as_str())
///                 .u16(|e| e.port),
///         )
///     }
/// }
///
/// let map: SplitMap<Endpoint, bool> = SplitMap::new();
/// map.insert(Endpoint { host: "db1".into(), port: 5432 }, true);
/// assert!(map.contains_key(&Endpoint { host: "db1".into(), port: 5432 }));
/// ```
pub struct RecordLayout<K> {
    fields: Vec<Field<K>>,
}

impl<K> RecordLayout<K> {
    /// An empty layout; chain builder calls to describe the key's fields.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Number of field accessors in the layout, nested layouts flattened.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The kinds of the registered accessors, in digest order.
    pub fn kinds(&self) -> impl Iterator<Item = FieldKind> + '_ {
        self.fields.iter().map(|field| field.kind)
    }

    /// Combine the per-field digests in declaration order.
    pub(crate) fn digest(&self, seed: Seed, key: &K) -> u32 {
        const MIX: u32 = 0x9e37_79b9;
        let mut h: u32 = 0;
        for field in &self.fields {
            let fd = (field.digest)(seed, key);
            h ^= fd
                .wrapping_add(MIX)
                .wrapping_add(h << 6)
                .wrapping_add(h >> 2);
        }
        h
    }
}

macro_rules! scalar_field {
    ($($name:ident: $ty:ty => $kind:ident),* $(,)?) => {
        $(
            #[doc = concat!("Appends an accessor for a `", stringify!($ty), "` field.")]
            pub fn $name(self, get: fn(&K) -> $ty) -> Self {
                self.push(FieldKind::$kind, move |seed: Seed, key: &K| {
                    bytes_digest(seed, &get(key).to_le_bytes())
                })
            }
        )*
    };
}

// Accessors capture plain `fn` getters, so layouts exist only for owned
// (`'static`) key types.
impl<K: 'static> RecordLayout<K> {
    fn push<F>(mut self, kind: FieldKind, digest: F) -> Self
    where
        F: Fn(Seed, &K) -> u32 + Send + Sync + 'static,
    {
        self.fields.push(Field {
            kind,
            digest: Arc::new(digest),
        });
        self
    }

    scalar_field! {
        u8: u8 => U8,
        i8: i8 => I8,
        u16: u16 => U16,
        i16: i16 => I16,
        u32: u32 => U32,
        i32: i32 => I32,
        u64: u64 => U64,
        i64: i64 => I64,
        u128: u128 => U128,
        i128: i128 => I128,
        usize: usize => Usize,
        isize: isize => Isize,
    }

    /// Appends an accessor for a `bool` field.
    pub fn bool(self, get: fn(&K) -> bool) -> Self {
        self.push(FieldKind::Bool, move |seed: Seed, key: &K| {
            bytes_digest(seed, &[get(key) as u8])
        })
    }

    /// Appends an accessor for a `char` field.
    pub fn char(self, get: fn(&K) -> char) -> Self {
        self.push(FieldKind::Char, move |seed: Seed, key: &K| {
            bytes_digest(seed, &(get(key) as u32).to_le_bytes())
        })
    }

    /// Appends an accessor for an `f32` field, digested by bit pattern:
    /// `0.0` and `-0.0` digest differently, and any NaN only matches its
    /// own bits.
    pub fn f32(self, get: fn(&K) -> f32) -> Self {
        self.push(FieldKind::F32, move |seed: Seed, key: &K| {
            bytes_digest(seed, &get(key).to_bits().to_le_bytes())
        })
    }

    /// Appends an accessor for an `f64` field, digested by bit pattern.
    pub fn f64(self, get: fn(&K) -> f64) -> Self {
        self.push(FieldKind::F64, move |seed: Seed, key: &K| {
            bytes_digest(seed, &get(key).to_bits().to_le_bytes())
        })
    }

    /// Appends an accessor for a string field.
    pub fn str(self, get: fn(&K) -> &str) -> Self {
        self.push(FieldKind::Str, move |seed: Seed, key: &K| {
            bytes_digest(seed, get(key).as_bytes())
        })
    }

    /// Splices in a nested record's layout, each of its accessors composed
    /// with `get`. The nested fields digest exactly as if they had been
    /// registered here directly.
    pub fn record<R: 'static>(mut self, get: fn(&K) -> &R, layout: RecordLayout<R>) -> Self {
        for field in layout.fields {
            let inner = field.digest;
            self.fields.push(Field {
                kind: field.kind,
                digest: Arc::new(move |seed: Seed, key: &K| inner(seed, get(key))),
            });
        }
        self
    }
}

impl<K> Clone for Field<K> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            digest: Arc::clone(&self.digest),
        }
    }
}

impl<K> Clone for RecordLayout<K> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
        }
    }
}

impl<K> fmt::Debug for RecordLayout<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.fields.iter().map(|field| field.kind))
            .finish()
    }
}

impl<K> Default for RecordLayout<K> {
    fn default() -> Self {
        Self::new()
    }
}
