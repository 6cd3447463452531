// Record-key test suite: composite keys digested through RecordLayout.
//
// The invariants exercised:
// - Equal keys digest equally, so record keys round-trip through the map
//   like any primitive key.
// - Fields without a registered accessor never affect the digest; keys
//   differing only there collide on digest yet remain distinct entries.
// - Nested layouts digest exactly like their hand-flattened equivalent,
//   and field order matters.
// - An empty layout is legal: everything lands on one digest and key
//   equality does the rest.
use splitmap::{FieldKind, HashKey, Hashable, KeyHasher, RecordLayout, Seed, SplitMap};

#[derive(Clone, Debug, PartialEq, Eq)]
struct DeviceKey {
    region: u16,
    node: u64,
    label: String,
    tags: Vec<String>, // no accessor kind exists for this field
}

impl HashKey for DeviceKey {
    fn hasher() -> KeyHasher<Self> {
        KeyHasher::record(
            RecordLayout::new()
                .u16(|k: &DeviceKey| k.region)
                .u64(|k| k.node)
                .str(|k| k.label.as_str()),
        )
    }
}

fn device(region: u16, node: u64, label: &str, tags: &[&str]) -> DeviceKey {
    DeviceKey {
        region,
        node,
        label: label.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

// Test: record keys behave like any other key through the full API.
// Verifies: insert/get/contains/remove_take round trip via the HashKey
// registration.
#[test]
fn record_keys_round_trip() {
    let map: SplitMap<DeviceKey, u32> = SplitMap::new();
    let a = device(1, 100, "edge-a", &[]);
    let b = device(1, 101, "edge-b", &["spare"]);

    assert_eq!(map.insert(a.clone(), 10), None);
    assert_eq!(map.insert(b.clone(), 20), None);
    assert_eq!(map.len(), 2);

    assert_eq!(map.get(&a), Some(10));
    assert!(map.contains_key(&b));
    assert_eq!(map.remove_take(&a), Some(10));
    assert_eq!(map.get(&a), None);
    assert_eq!(map.len(), 1);
}

// Test: unregistered fields are digest-invisible.
// Assumes: tags has no accessor, so it cannot reach the digest.
// Verifies: the two keys share a digest yet stay separate entries,
// resolved by Eq inside the shard.
#[test]
fn unregistered_fields_collide_but_stay_distinct() {
    let a = device(1, 2, "x", &["alpha"]);
    let b = device(1, 2, "x", &["beta"]);
    assert_ne!(a, b);

    let hasher = DeviceKey::hasher();
    let seed = Seed::from_u64(1);
    assert_eq!(hasher.digest(seed, &a), hasher.digest(seed, &b));

    let map: SplitMap<DeviceKey, &str> = SplitMap::new();
    map.insert(a.clone(), "first");
    map.insert(b.clone(), "second");
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&a), Some("first"));
    assert_eq!(map.get(&b), Some("second"));
}

// Test: record digests are deterministic per seed and perturbed by it.
#[test]
fn record_digests_follow_seed() {
    let hasher = DeviceKey::hasher();
    let keys: Vec<DeviceKey> = (0..16).map(|i| device(i as u16, i, "node", &[])).collect();

    let under = |seed: Seed| -> Vec<u32> {
        keys.iter().map(|k| hasher.digest(seed, k)).collect()
    };
    assert_eq!(under(Seed::from_u64(7)), under(Seed::from_u64(7)));
    assert_ne!(under(Seed::from_u64(7)), under(Seed::from_u64(8)));

    // Equal contents from different allocations digest equally.
    let seed = Seed::from_u64(3);
    assert_eq!(
        hasher.digest(seed, &device(9, 9, "same", &[])),
        hasher.digest(seed, &device(9, 9, "same", &[]))
    );
}

// ---- Nested layouts ----

#[derive(Clone, PartialEq, Eq)]
struct Inner {
    a: u8,
    b: i64,
}

#[derive(Clone, PartialEq, Eq)]
struct Outer {
    id: u32,
    inner: Inner,
}

fn nested_hasher() -> KeyHasher<Outer> {
    let inner = RecordLayout::new().u8(|i: &Inner| i.a).i64(|i| i.b);
    KeyHasher::record(
        RecordLayout::new()
            .u32(|k: &Outer| k.id)
            .record(|k| &k.inner, inner),
    )
}

fn flat_hasher() -> KeyHasher<Outer> {
    KeyHasher::record(
        RecordLayout::new()
            .u32(|k: &Outer| k.id)
            .u8(|k| k.inner.a)
            .i64(|k| k.inner.b),
    )
}

// Test: nesting is digest-transparent.
// Verifies: the spliced layout agrees with the hand-flattened one on
// every sampled key, and the map operates on top of it.
#[test]
fn nested_layout_matches_flat_through_map() {
    let nested = nested_hasher();
    let flat = flat_hasher();
    let seed = Seed::from_u64(21);

    for id in 0..32u32 {
        let key = Outer {
            id,
            inner: Inner {
                a: id as u8,
                b: -(id as i64),
            },
        };
        assert_eq!(nested.digest(seed, &key), flat.digest(seed, &key));
    }

    let map: SplitMap<Outer, u32> =
        SplitMap::with_shards_hasher_and_seed(8, nested_hasher(), Seed::from_u64(21));
    let key = Outer {
        id: 5,
        inner: Inner { a: 5, b: -5 },
    };
    map.insert(key.clone(), 55);
    assert_eq!(map.get(&key), Some(55));
}

// Test: accessor order is part of the digest.
#[test]
fn field_order_changes_digest() {
    let ab = KeyHasher::record(
        RecordLayout::new()
            .u32(|k: &Outer| k.id)
            .u8(|k| k.inner.a),
    );
    let ba = KeyHasher::record(
        RecordLayout::new()
            .u8(|k: &Outer| k.inner.a)
            .u32(|k| k.id),
    );
    let key = Outer {
        id: 1,
        inner: Inner { a: 2, b: 0 },
    };
    let seed = Seed::from_u64(4);
    assert_ne!(ab.digest(seed, &key), ba.digest(seed, &key));
}

// Test: the empty layout degenerates gracefully.
// Assumes: every key digests alike, so everything shares one shard slot
// chain and Eq separates the entries.
#[test]
fn empty_layout_is_legal() {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Opaque(u32);

    let map: SplitMap<Opaque, u32> = SplitMap::with_hasher(KeyHasher::record(RecordLayout::new()));
    for i in 0..20 {
        map.insert(Opaque(i), i);
    }
    assert_eq!(map.len(), 20);
    for i in 0..20 {
        assert_eq!(map.get(&Opaque(i)), Some(i));
    }
    assert!(map.remove(&Opaque(7)));
    assert_eq!(map.len(), 19);
}

// Test: layout introspection after flattening.
// Verifies: kinds/len report the final accessor list in digest order.
#[test]
fn kinds_reflect_flattened_layout() {
    let inner = RecordLayout::new().u8(|i: &Inner| i.a).i64(|i| i.b);
    let layout = RecordLayout::new()
        .u32(|k: &Outer| k.id)
        .record(|k| &k.inner, inner);

    assert_eq!(layout.len(), 3);
    assert!(!layout.is_empty());
    let kinds: Vec<FieldKind> = layout.kinds().collect();
    assert_eq!(kinds, [FieldKind::U32, FieldKind::U8, FieldKind::I64]);
}

// Test: float accessors digest bit patterns.
// Verifies: the IEEE zeros differ; identical bits agree. Floats carry no
// Eq, so this stays a digest-level law rather than a map test.
#[test]
fn float_fields_digest_by_bits() {
    let hasher = KeyHasher::record(RecordLayout::new().f64(|k: &f64| *k));
    let seed = Seed::from_u64(2);
    assert_ne!(hasher.digest(seed, &0.0), hasher.digest(seed, &-0.0));
    assert_eq!(hasher.digest(seed, &1.5), hasher.digest(seed, &1.5));
    assert_eq!(hasher.digest(seed, &f64::NAN), hasher.digest(seed, &f64::NAN));
}

// ---- Other strategies as HashKey registrations ----

#[derive(Clone, PartialEq, Eq)]
struct Token {
    bits: u64,
}

impl Hashable for Token {
    fn digest(&self, seed: Seed) -> u32 {
        u64::hasher().digest(seed, &self.bits)
    }
}

impl HashKey for Token {
    fn hasher() -> KeyHasher<Self> {
        KeyHasher::self_hash()
    }
}

// Test: a self-hashing key registered through HashKey.
// Verifies: the capability strategy drives the default constructors.
#[test]
fn self_hashing_key_round_trips() {
    let map: SplitMap<Token, String> = SplitMap::new();
    map.insert(Token { bits: 42 }, "answer".to_string());
    assert_eq!(map.get(&Token { bits: 42 }), Some("answer".to_string()));
    assert!(!map.contains_key(&Token { bits: 43 }));
}

// Test: explicit record hasher over a type with no HashKey impl.
// Verifies: with_shards_and_hasher carries the layout end to end.
#[test]
fn explicit_record_hasher_over_tuple_key() {
    let hasher = KeyHasher::record(
        RecordLayout::new()
            .u16(|k: &(u16, String)| k.0)
            .str(|k| k.1.as_str()),
    );
    let map: SplitMap<(u16, String), u64> = SplitMap::with_shards_and_hasher(4, hasher);

    map.insert((7, "seven".to_string()), 7);
    map.insert((8, "eight".to_string()), 8);
    assert_eq!(map.get(&(7, "seven".to_string())), Some(7));
    assert_eq!(map.remove_take(&(8, "eight".to_string())), Some(8));
    assert_eq!(map.len(), 1);
}
