//! splitmap: A sharded concurrent key-value map with per-shard locking
//! and a type-specialized key-digest subsystem.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build SplitMap in small, independently verifiable layers, with
//!   all type-specific hashing resolved once at construction and all
//!   locking confined to one layer.
//! - Layers:
//!   - hash: `Seed`, `FieldKind`, the `Hashable`/`HashKey` capability
//!     traits, and `KeyHasher<K>`, a four-way strategy resolved to a tag
//!     plus plain function pointers (or a record layout) at construction.
//!   - record: `RecordLayout<K>`, an ordered list of safe field-accessor
//!     closures for digesting composite keys, with nested layouts
//!     flattened at build time.
//!   - shard: one `RwLock<HashTable<Slot>>` per shard; digest-addressed
//!     get/insert/remove and the compound read-modify-write operations.
//!   - split_map: `SplitMap<K, V>` routes each digest to a shard with a
//!     power-of-two mask and exposes the public API plus whole-map views.
//!
//! Constraints
//! - Thread-safe throughout: every method takes `&self`, and the map is
//!   `Send + Sync` whenever `K` and `V` are (no unsafe impls; the RwLocks
//!   carry the interior mutability).
//! - One lock per shard, no global lock, and no operation ever holds two
//!   shard locks at once.
//! - Shard counts are always powers of two so routing is a mask, never a
//!   division; count hints are normalized silently rather than rejected.
//! - No unsafe code anywhere in the crate.
//!
//! Why this split?
//! - Localize invariants: hashing never touches locks, shards never see
//!   key types' hashing details (only digests), and the routing shell has
//!   no state of its own beyond the shard array.
//! - One dispatch point: strategy selection happens once per map, not per
//!   operation, so the per-call cost is a single enum branch.
//! - Clear failure boundaries: shards call user code only through `Eq`
//!   during probing and through the explicitly documented `compute` and
//!   visitor closures.
//!
//! Digest and rehashing invariants
//! - Each slot stores its 32-bit digest; table growth rehashes from the
//!   stored field, so digest routines run at most once per operation and
//!   never during growth.
//! - For a fixed `(seed, key)` pair the digest is stable, so a key's
//!   shard assignment never changes within a map instance.
//! - Equal keys digest equally under every strategy; digest collisions
//!   are resolved by `Eq` inside the shard.
//!
//! Locking discipline
//! - Single-key operations hold exactly one shard lock for their whole
//!   duration, so compound operations (`get_or_insert`, `compute`) are
//!   atomic per key and concurrent callers agree on one winner.
//! - Whole-map operations (`len`, `clear`, `for_each`, snapshots) visit
//!   shards strictly one at a time and are weakly consistent under
//!   concurrent writers.
//! - Closures passed to `compute` and `for_each` run under a shard lock;
//!   calling back into the map from them may deadlock.
//!
//! Notes and non-goals
//! - Accessors clone values out rather than leasing references; keep
//!   values cheap to clone or wrap them in `Arc`.
//! - Record layouts digest only fields with a registered kind; a field
//!   with no accessor simply never contributes, and keys differing only
//!   in such fields are separated by `Eq`, not by digest.
//! - No eviction, TTLs, capacity limits, or serialization; this is a
//!   plain map.
//! - Lock poisoning is absent (parking_lot): a panicking writer unlocks
//!   on unwind.

mod hash;
mod hash_proptest;
mod record;
mod shard;
mod split_map;

// Public surface
pub use hash::{FieldKind, HashKey, Hashable, KeyHasher, Seed};
pub use record::RecordLayout;
pub use split_map::{SplitMap, DEFAULT_SHARD_COUNT};
