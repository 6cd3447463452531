//! One lock-striped partition: a digest-keyed table behind a single RwLock.

use core::mem;

use hashbrown::HashTable;
use parking_lot::RwLock;

/// A stored entry. The digest is computed once, on the way in; growth
/// rehashes from this field and never re-runs a digest routine.
struct Slot<K, V> {
    digest: u32,
    key: K,
    value: V,
}

/// Widens a 32-bit digest into the table's 64-bit hash. The table takes
/// its bucket index from the low bits and its control byte from the top
/// bits; routing fixes every resident digest's low bits, and a multiply
/// alone leaves the product's low bits tied to them, so the high word is
/// folded back down.
#[inline]
fn spread(digest: u32) -> u64 {
    let widened = (digest as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    widened ^ (widened >> 32)
}

/// One partition of the map. Every operation here takes the digest the
/// caller already computed; the shard never sees the hasher.
///
/// Each method acquires this shard's lock once, for its whole duration, so
/// the compound operations (`get_or_insert`, `insert_if_absent`, `compute`)
/// are atomic with respect to other calls on the same shard.
pub(crate) struct Shard<K, V> {
    table: RwLock<HashTable<Slot<K, V>>>,
}

impl<K, V> Shard<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            table: RwLock::new(HashTable::new()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.table.read().len()
    }

    pub(crate) fn clear(&self) {
        *self.table.write() = HashTable::new();
    }

    /// Visits every entry under the read lock. Returns `false` as soon as
    /// the visitor does, without touching the remaining entries.
    pub(crate) fn for_each<F>(&self, visitor: &mut F) -> bool
    where
        F: FnMut(&K, &V) -> bool,
    {
        let table = self.table.read();
        for slot in table.iter() {
            if !visitor(&slot.key, &slot.value) {
                return false;
            }
        }
        true
    }
}

impl<K: Eq, V> Shard<K, V> {
    pub(crate) fn get(&self, digest: u32, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.table
            .read()
            .find(spread(digest), |slot| {
                slot.digest == digest && slot.key == *key
            })
            .map(|slot| slot.value.clone())
    }

    pub(crate) fn contains_key(&self, digest: u32, key: &K) -> bool {
        self.table
            .read()
            .find(spread(digest), |slot| {
                slot.digest == digest && slot.key == *key
            })
            .is_some()
    }

    /// Inserts or overwrites, returning the displaced value.
    pub(crate) fn insert(&self, digest: u32, key: K, value: V) -> Option<V> {
        let mut table = self.table.write();
        match table.entry(
            spread(digest),
            |slot| slot.digest == digest && slot.key == key,
            |slot| spread(slot.digest),
        ) {
            hashbrown::hash_table::Entry::Occupied(mut o) => {
                Some(mem::replace(&mut o.get_mut().value, value))
            }
            hashbrown::hash_table::Entry::Vacant(v) => {
                let _ = v.insert(Slot { digest, key, value });
                None
            }
        }
    }

    pub(crate) fn remove(&self, digest: u32, key: &K) -> bool {
        let mut table = self.table.write();
        match table.find_entry(spread(digest), |slot| {
            slot.digest == digest && slot.key == *key
        }) {
            Ok(o) => {
                o.remove();
                true
            }
            Err(_) => false,
        }
    }

    pub(crate) fn remove_take(&self, digest: u32, key: &K) -> Option<V> {
        let mut table = self.table.write();
        match table.find_entry(spread(digest), |slot| {
            slot.digest == digest && slot.key == *key
        }) {
            Ok(o) => {
                let (slot, _) = o.remove();
                Some(slot.value)
            }
            Err(_) => None,
        }
    }

    /// Returns the resident value and whether it was already present;
    /// `value` is stored only on a miss.
    pub(crate) fn get_or_insert(&self, digest: u32, key: K, value: V) -> (V, bool)
    where
        V: Clone,
    {
        let mut table = self.table.write();
        match table.entry(
            spread(digest),
            |slot| slot.digest == digest && slot.key == key,
            |slot| spread(slot.digest),
        ) {
            hashbrown::hash_table::Entry::Occupied(o) => (o.get().value.clone(), true),
            hashbrown::hash_table::Entry::Vacant(v) => {
                let out = value.clone();
                let _ = v.insert(Slot { digest, key, value });
                (out, false)
            }
        }
    }

    /// Stores `value` only if the key is absent. Returns whether it did.
    pub(crate) fn insert_if_absent(&self, digest: u32, key: K, value: V) -> bool {
        let mut table = self.table.write();
        match table.entry(
            spread(digest),
            |slot| slot.digest == digest && slot.key == key,
            |slot| spread(slot.digest),
        ) {
            hashbrown::hash_table::Entry::Occupied(_) => false,
            hashbrown::hash_table::Entry::Vacant(v) => {
                let _ = v.insert(Slot { digest, key, value });
                true
            }
        }
    }

    /// Derives the new value from the current one (or `None`) and stores
    /// it, all under one write-lock hold. The closure must not call back
    /// into the owning map.
    pub(crate) fn compute<F>(&self, digest: u32, key: K, f: F) -> V
    where
        V: Clone,
        F: FnOnce(Option<&V>) -> V,
    {
        let mut table = self.table.write();
        match table.entry(
            spread(digest),
            |slot| slot.digest == digest && slot.key == key,
            |slot| spread(slot.digest),
        ) {
            hashbrown::hash_table::Entry::Occupied(mut o) => {
                let slot = o.get_mut();
                let next = f(Some(&slot.value));
                let out = next.clone();
                slot.value = next;
                out
            }
            hashbrown::hash_table::Entry::Vacant(v) => {
                let next = f(None);
                let out = next.clone();
                let _ = v.insert(Slot {
                    digest,
                    key,
                    value: next,
                });
                out
            }
        }
    }
}
