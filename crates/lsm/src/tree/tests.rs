use super::*;
use config::LsmConfig;
use pagecache::Lru;

fn pool() -> BufferPool {
    BufferPool::new(4, 64, 8, Box::new(Lru::new()))
}

fn small_cfg() -> LsmConfig {
    LsmConfig {
        bloom_bits_per_entry: 10,
        input_buffer_pages: 4,
        output_buffer_pages: 4,
        size_ratio: 2,
    }
}

#[test]
fn get_after_single_flush_finds_every_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = LsmTree::new(dir.path().to_path_buf(), &small_cfg());
    let mut pool = pool();

    let run: Vec<(Key, Value)> = (0..50u64).map(|k| (k, k * 10)).collect();
    tree.flush_memtable(&run, &mut pool).unwrap();

    for &(k, v) in &run {
        assert_eq!(tree.get(k, &mut pool).unwrap(), Some(v));
    }
    assert_eq!(tree.get(9999, &mut pool).unwrap(), None);
}

#[test]
fn shallower_flush_shadows_older_value_for_same_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = LsmTree::new(dir.path().to_path_buf(), &small_cfg());
    let mut pool = pool();

    tree.flush_memtable(&[(1, 100)], &mut pool).unwrap();
    tree.flush_memtable(&[(1, 200)], &mut pool).unwrap();

    // Two flushes into level 0 trigger a cascade merge; the newer value
    // must win regardless of which level it ends up in.
    assert_eq!(tree.get(1, &mut pool).unwrap(), Some(200));
}

#[test]
fn tombstone_masks_older_value_and_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = LsmTree::new(dir.path().to_path_buf(), &small_cfg());
    let mut pool = pool();

    tree.flush_memtable(&[(1, 100)], &mut pool).unwrap();
    tree.flush_memtable(&[(1, kvcore::TOMBSTONE)], &mut pool).unwrap();

    assert_eq!(tree.get(1, &mut pool).unwrap(), None);
}

#[test]
fn third_flush_cascades_into_level_1() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = LsmTree::new(dir.path().to_path_buf(), &small_cfg());
    let mut pool = pool();

    tree.flush_memtable(&[(1, 1)], &mut pool).unwrap();
    tree.flush_memtable(&[(2, 2)], &mut pool).unwrap();
    // First two flushes merge level 0 -> level 1.
    assert_eq!(tree.levels()[0].sst_count(), 0);
    assert_eq!(tree.levels()[1].sst_count(), 1);

    tree.flush_memtable(&[(3, 3)], &mut pool).unwrap();
    assert_eq!(tree.levels()[0].sst_count(), 1);
    assert_eq!(tree.levels()[1].sst_count(), 1);

    for k in 1..=3u64 {
        assert_eq!(tree.get(k, &mut pool).unwrap(), Some(k));
    }
}

#[test]
fn scan_merges_across_levels_with_shallow_wins_and_drops_tombstones() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = LsmTree::new(dir.path().to_path_buf(), &small_cfg());
    let mut pool = pool();

    tree.flush_memtable(&[(1, 1), (2, 2), (3, 3)], &mut pool).unwrap();
    tree.flush_memtable(&[(2, kvcore::TOMBSTONE), (4, 4)], &mut pool)
        .unwrap();

    let got = tree.scan(1, 4, &mut pool).unwrap();
    assert_eq!(got, vec![(1, 1), (3, 3), (4, 4)]);
}

#[test]
fn scan_with_inverted_bounds_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = LsmTree::new(dir.path().to_path_buf(), &small_cfg());
    let mut pool = pool();
    tree.flush_memtable(&[(1, 1)], &mut pool).unwrap();
    assert!(tree.scan(5, 1, &mut pool).unwrap().is_empty());
}
