use super::*;

#[test]
fn default_builder_produces_valid_config() {
    let cfg = StoreConfig::builder().build().unwrap();
    assert_eq!(cfg.memtable_max_entries, 1024);
    assert!(!cfg.is_lsm_mode());
}

#[test]
fn zero_memtable_capacity_is_rejected() {
    let result = StoreConfig::builder().memtable_max_entries(0).build();
    assert!(result.is_err());
}

#[test]
fn lsm_mode_requires_btree_search() {
    let result = StoreConfig::builder()
        .search_mode(SearchMode::BinarySearch)
        .lsm(LsmConfig::default())
        .build();
    assert!(result.is_err());
}

#[test]
fn lsm_mode_with_btree_search_is_accepted() {
    let cfg = StoreConfig::builder()
        .search_mode(SearchMode::BTreeSearch)
        .lsm(LsmConfig::default())
        .build()
        .unwrap();
    assert!(cfg.is_lsm_mode());
}

#[test]
fn size_ratio_other_than_two_is_rejected() {
    let mut lsm = LsmConfig::default();
    lsm.size_ratio = 3;
    let result = StoreConfig::builder()
        .search_mode(SearchMode::BTreeSearch)
        .lsm(lsm)
        .build();
    assert!(result.is_err());
}

#[test]
fn zero_bloom_bits_is_rejected() {
    let mut lsm = LsmConfig::default();
    lsm.bloom_bits_per_entry = 0;
    let result = StoreConfig::builder()
        .search_mode(SearchMode::BTreeSearch)
        .lsm(lsm)
        .build();
    assert!(result.is_err());
}

#[test]
fn buffer_pool_max_below_min_is_rejected() {
    let bp = BufferPoolConfig {
        min_size: 100,
        max_size: 10,
        eviction: EvictionKind::Lru,
        bucket_max_size: 4,
    };
    let result = StoreConfig::builder().buffer_pool(bp).build();
    assert!(result.is_err());
}

#[test]
fn buffer_pool_sizes_round_down_to_power_of_two() {
    let bp = BufferPoolConfig {
        min_size: 17,
        max_size: 1000,
        eviction: EvictionKind::Clock,
        bucket_max_size: 4,
    };
    assert_eq!(bp.rounded(), (16, 512));
}

#[test]
fn round_down_pow2_handles_exact_powers() {
    assert_eq!(round_down_pow2(1), 1);
    assert_eq!(round_down_pow2(2), 2);
    assert_eq!(round_down_pow2(1024), 1024);
    assert_eq!(round_down_pow2(0), 0);
}
