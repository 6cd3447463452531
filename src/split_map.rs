//! The public map: power-of-two digest routing over independent shards.

use core::fmt;

use crate::hash::{HashKey, KeyHasher, Seed};
use crate::shard::Shard;

/// Shard count used when a hint of `0` is passed, and by the constructors
/// that take no hint.
pub const DEFAULT_SHARD_COUNT: usize = 32;

/// A shard-count hint is never rejected: `0` means "use the default", and
/// anything else is rounded up to the next power of two so routing can mask
/// instead of divide. Hints past the largest representable power of two
/// saturate there.
pub(crate) fn normalize_shard_count(hint: usize) -> usize {
    if hint == 0 {
        DEFAULT_SHARD_COUNT
    } else {
        hint.checked_next_power_of_two()
            .unwrap_or(1 << (usize::BITS - 1))
    }
}

/// A concurrent key-value map split across independently locked shards.
///
/// Every key digests to 32 bits; the low bits of the digest pick the shard
/// and the full digest indexes within it, so any two operations on
/// different shards never contend. Operations on a single key are
/// serialized by that key's shard lock; whole-map views (`len`, `for_each`,
/// the snapshot methods) visit shards one at a time and are only weakly
/// consistent under concurrent writers.
///
/// All methods take `&self`; share the map between threads as-is or inside
/// an `Arc`.
///
/// ```
/// use splitmap::SplitMap;
///
/// let visits: SplitMap<String, u64> = SplitMap::new();
/// visits.insert("home".to_string(), 1);
///
/// let (n, existed) = visits.get_or_insert("about".to_string(), 1);
/// assert!(!existed);
/// assert_eq!(n, 1);
///
/// assert_eq!(visits.len(), 2);
/// assert!(visits.remove(&"home".to_string()));
/// ```
pub struct SplitMap<K, V> {
    shards: Box<[Shard<K, V>]>,
    mask: usize,
    hasher: KeyHasher<K>,
    seed: Seed,
}

impl<K: HashKey, V> SplitMap<K, V> {
    /// A map with the default shard count and the key type's canonical
    /// hasher.
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARD_COUNT)
    }

    /// A map with (roughly) `shard_count` shards; see
    /// [`shard_count`](Self::shard_count) for the normalized value.
    pub fn with_shards(shard_count: usize) -> Self {
        Self::with_shards_and_hasher(shard_count, K::hasher())
    }

    /// A map with an explicit seed, for reproducible digests across
    /// instances.
    pub fn with_shards_and_seed(shard_count: usize, seed: Seed) -> Self {
        Self::with_shards_hasher_and_seed(shard_count, K::hasher(), seed)
    }
}

impl<K, V> SplitMap<K, V> {
    /// A map with an explicit digest strategy, for key types that do not
    /// (or cannot) implement [`HashKey`].
    pub fn with_hasher(hasher: KeyHasher<K>) -> Self {
        Self::with_shards_and_hasher(DEFAULT_SHARD_COUNT, hasher)
    }

    pub fn with_shards_and_hasher(shard_count: usize, hasher: KeyHasher<K>) -> Self {
        Self::with_shards_hasher_and_seed(shard_count, hasher, Seed::random())
    }

    /// The root constructor: every other constructor funnels here.
    pub fn with_shards_hasher_and_seed(
        shard_count: usize,
        hasher: KeyHasher<K>,
        seed: Seed,
    ) -> Self {
        let count = normalize_shard_count(shard_count);
        let shards: Box<[Shard<K, V>]> = (0..count).map(|_| Shard::new()).collect();
        Self {
            shards,
            mask: count - 1,
            hasher,
            seed,
        }
    }

    /// Total entries, summed shard by shard. Weakly consistent: concurrent
    /// writers may land between shard reads.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties every shard, one at a time; never holds two locks at once.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.clear();
        }
    }

    /// The normalized shard count this map was built with.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Visits entries shard by shard until the visitor returns `false`.
    ///
    /// Each shard's read lock is held only while that shard is walked, so
    /// the view is weakly consistent and the visitor must not call back
    /// into this map.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for shard in self.shards.iter() {
            if !shard.for_each(&mut visitor) {
                return;
            }
        }
    }

    /// Snapshot of the keys, in shard order.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut out = Vec::with_capacity(self.len());
        self.for_each(|key, _| {
            out.push(key.clone());
            true
        });
        out
    }

    /// Snapshot of the values, in shard order.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        let mut out = Vec::with_capacity(self.len());
        self.for_each(|_, value| {
            out.push(value.clone());
            true
        });
        out
    }

    /// Snapshot of the entries, in shard order.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let mut out = Vec::with_capacity(self.len());
        self.for_each(|key, value| {
            out.push((key.clone(), value.clone()));
            true
        });
        out
    }
}

impl<K: Eq, V> SplitMap<K, V> {
    #[inline]
    fn digest(&self, key: &K) -> u32 {
        self.hasher.digest(self.seed, key)
    }

    #[inline]
    fn shard_for(&self, digest: u32) -> &Shard<K, V> {
        &self.shards[(digest as usize) & self.mask]
    }

    /// Inserts or overwrites, returning the displaced value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let digest = self.digest(&key);
        self.shard_for(digest).insert(digest, key, value)
    }

    /// Clones the value out, if present.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let digest = self.digest(key);
        self.shard_for(digest).get(digest, key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let digest = self.digest(key);
        self.shard_for(digest).contains_key(digest, key)
    }

    /// Removes the entry. Returns whether one was present.
    pub fn remove(&self, key: &K) -> bool {
        let digest = self.digest(key);
        self.shard_for(digest).remove(digest, key)
    }

    /// Removes the entry and hands back its value.
    pub fn remove_take(&self, key: &K) -> Option<V> {
        let digest = self.digest(key);
        self.shard_for(digest).remove_take(digest, key)
    }

    /// Returns the resident value and whether it was already present,
    /// storing `value` only on a miss. One lock hold: concurrent callers
    /// for the same key agree on a single winner.
    pub fn get_or_insert(&self, key: K, value: V) -> (V, bool)
    where
        V: Clone,
    {
        let digest = self.digest(&key);
        self.shard_for(digest).get_or_insert(digest, key, value)
    }

    /// Stores `value` only if the key is absent; reports whether it did.
    pub fn insert_if_absent(&self, key: K, value: V) -> bool {
        let digest = self.digest(&key);
        self.shard_for(digest).insert_if_absent(digest, key, value)
    }

    /// Derives the new value from the current one (`None` on a miss),
    /// stores it, and returns it, atomically for this key.
    ///
    /// The closure runs under the shard's write lock and must not call
    /// back into this map.
    pub fn compute<F>(&self, key: K, f: F) -> V
    where
        V: Clone,
        F: FnOnce(Option<&V>) -> V,
    {
        let digest = self.digest(&key);
        self.shard_for(digest).compute(digest, key, f)
    }
}

/// Deep copy: same shard count, hasher, and seed, so clones route every
/// key identically to the original.
impl<K: Eq + Clone, V: Clone> Clone for SplitMap<K, V> {
    fn clone(&self) -> Self {
        let twin =
            Self::with_shards_hasher_and_seed(self.shards.len(), self.hasher.clone(), self.seed);
        self.for_each(|key, value| {
            twin.insert(key.clone(), value.clone());
            true
        });
        twin
    }
}

impl<K, V> fmt::Debug for SplitMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitMap")
            .field("len", &self.len())
            .field("shards", &self.shards.len())
            .finish()
    }
}

impl<K: HashKey, V> Default for SplitMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
