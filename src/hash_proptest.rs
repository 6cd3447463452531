#![cfg(test)]

// Property tests for the digest subsystem, kept inside the crate so they
// can reach internal helpers (the shard-count normalizer) without feature
// gates.

use crate::hash::{HashKey, Seed};
use crate::record::RecordLayout;
use crate::split_map::normalize_shard_count;
use proptest::prelude::*;

// Property: digests are a pure function of (seed, key). Separate hasher
// instances and clones agree on every input.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_scalar_digests_deterministic(key in any::<u64>(), raw_seed in any::<u64>()) {
        let seed = Seed::from_u64(raw_seed);
        let a = u64::hasher();
        let b = u64::hasher();
        let c = a.clone();
        let d = a.digest(seed, &key);
        prop_assert_eq!(d, b.digest(seed, &key));
        prop_assert_eq!(d, c.digest(seed, &key));
    }
}

// Property: text digests depend on contents only; a second allocation of
// the same characters digests identically.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_text_digests_follow_contents(s in "[a-z0-9]{0,16}", raw_seed in any::<u64>()) {
        let seed = Seed::from_u64(raw_seed);
        let hasher = String::hasher();
        let copy = s.clone();
        prop_assert_eq!(hasher.digest(seed, &copy), hasher.digest(seed, &s));
    }
}

// Property: splicing a nested layout is digest-equivalent to registering
// the same accessors flat on the outer key, for all field values.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_nested_layout_matches_flat(
        a in any::<u8>(),
        b in any::<i64>(),
        s in "[a-z]{0,12}",
        raw_seed in any::<u64>(),
    ) {
        let seed = Seed::from_u64(raw_seed);
        let key = (a, (b, s));

        let inner = RecordLayout::new()
            .i64(|t: &(i64, String)| t.0)
            .str(|t| t.1.as_str());
        let nested = RecordLayout::new()
            .u8(|k: &(u8, (i64, String))| k.0)
            .record(|k| &k.1, inner);
        let flat = RecordLayout::new()
            .u8(|k: &(u8, (i64, String))| k.0)
            .i64(|k| (k.1).0)
            .str(|k| (k.1).1.as_str());

        prop_assert_eq!(nested.digest(seed, &key), flat.digest(seed, &key));
    }
}

// Property: fields without a registered accessor never reach the digest,
// so keys differing only there digest identically.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_unregistered_fields_never_contribute(
        id in any::<u64>(),
        tags_a in proptest::collection::vec("[a-z]{0,4}", 0..4),
        tags_b in proptest::collection::vec("[a-z]{0,4}", 0..4),
        raw_seed in any::<u64>(),
    ) {
        let seed = Seed::from_u64(raw_seed);
        let layout = RecordLayout::new().u64(|k: &(u64, Vec<String>)| k.0);
        prop_assert_eq!(
            layout.digest(seed, &(id, tags_a)),
            layout.digest(seed, &(id, tags_b))
        );
    }
}

// Property: every shard-count hint normalizes to a power of two, and the
// masked shard index is stable and in range for any digest.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_routing_is_masked_and_stable(
        hint in 0usize..=4096,
        raw_seed in any::<u64>(),
        keys in proptest::collection::vec(any::<u64>(), 1..64),
    ) {
        let count = normalize_shard_count(hint);
        prop_assert!(count.is_power_of_two());
        prop_assert!(count >= 1);

        let seed = Seed::from_u64(raw_seed);
        let hasher = u64::hasher();
        for key in &keys {
            let digest = hasher.digest(seed, key);
            prop_assert_eq!(digest, hasher.digest(seed, key));
            prop_assert!(((digest as usize) & (count - 1)) < count);
        }
    }
}
