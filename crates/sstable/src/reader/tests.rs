use super::*;
use crate::writer::{BTreeSstWriter, FlatSstWriter};
use pagecache::{BufferPool, Lru};

fn pool() -> BufferPool {
    BufferPool::new(4, 64, 8, Box::new(Lru::new()))
}

#[test]
fn btree_point_lookup_finds_every_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    let entries: Vec<(Key, Value)> = (0..5000u64).map(|k| (k, k * 3)).collect();
    BTreeSstWriter::write(&path, &entries, Some(10)).unwrap();

    let reader = BTreeSstReader::open(&path).unwrap();
    let mut pool = pool();
    for &(k, v) in entries.iter().step_by(37) {
        assert_eq!(reader.find(k, &mut pool).unwrap(), Some(v));
    }
}

#[test]
fn btree_point_lookup_missing_key_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    let entries: Vec<(Key, Value)> = (0..100u64).map(|k| (k * 2, k)).collect(); // even keys only
    BTreeSstWriter::write(&path, &entries, Some(10)).unwrap();

    let reader = BTreeSstReader::open(&path).unwrap();
    let mut pool = pool();
    assert_eq!(reader.find(7, &mut pool).unwrap(), None);
}

#[test]
fn bloom_filter_short_circuits_before_disk_descent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    let entries: Vec<(Key, Value)> = vec![(5, 50)];
    BTreeSstWriter::write(&path, &entries, Some(20)).unwrap();

    let reader = BTreeSstReader::open(&path).unwrap();
    let mut pool = pool();
    // A key never inserted: bloom almost certainly rejects it outright.
    // Either way find() must still return None.
    assert_eq!(reader.find(999_999, &mut pool).unwrap(), None);
    assert_eq!(reader.find(5, &mut pool).unwrap(), Some(50));
}

#[test]
fn btree_scan_returns_inclusive_ascending_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    let entries: Vec<(Key, Value)> = (0..2000u64).map(|k| (k, k)).collect();
    BTreeSstWriter::write(&path, &entries, None).unwrap();

    let reader = BTreeSstReader::open(&path).unwrap();
    let mut pool = pool();
    let got = reader.scan(500, 510, &mut pool).unwrap();
    let want: Vec<(Key, Value)> = (500..=510).map(|k| (k, k)).collect();
    assert_eq!(got, want);
}

#[test]
fn btree_scan_with_inverted_bounds_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    BTreeSstWriter::write(&path, &[(1, 1), (2, 2)], None).unwrap();

    let reader = BTreeSstReader::open(&path).unwrap();
    let mut pool = pool();
    assert!(reader.scan(5, 1, &mut pool).unwrap().is_empty());
}

#[test]
fn btree_reader_reuses_buffer_pool_across_calls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    let entries: Vec<(Key, Value)> = (0..4000u64).map(|k| (k, k)).collect();
    BTreeSstWriter::write(&path, &entries, None).unwrap();

    let reader = BTreeSstReader::open(&path).unwrap();
    let mut pool = pool();
    reader.find(10, &mut pool).unwrap();
    let size_after_first = pool.size();
    reader.find(10, &mut pool).unwrap();
    // Repeated lookups of the same key should not grow the cache further.
    assert_eq!(pool.size(), size_after_first);
}

#[test]
fn flat_reader_point_lookup_and_scan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flat.sst");
    let entries: Vec<(Key, Value)> = (0..1500u64).map(|k| (k, k + 100)).collect();
    FlatSstWriter::write(&path, &entries).unwrap();

    let reader = FlatSstReader::open(&path).unwrap();
    let mut pool = pool();
    assert_eq!(reader.find(42, &mut pool).unwrap(), Some(142));
    assert_eq!(reader.find(999_999, &mut pool).unwrap(), None);

    let got = reader.scan(10, 15, &mut pool).unwrap();
    let want: Vec<(Key, Value)> = (10..=15).map(|k| (k, k + 100)).collect();
    assert_eq!(got, want);
}

#[test]
fn btree_point_lookup_finds_every_key_across_a_multi_page_internal_level() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    // 513 leaf pages (256 entries each) needs two internal pages to fence
    // them (512 fence keys per internal page), exercising the descent's
    // `page_in_level > 0` branch that routes into the second one.
    let entries: Vec<(Key, Value)> = (0..131_328u64).map(|k| (k, k * 10)).collect();
    BTreeSstWriter::write(&path, &entries, Some(10)).unwrap();

    let reader = BTreeSstReader::open(&path).unwrap();
    let mut pool = pool();
    for &(k, v) in &entries {
        assert_eq!(reader.find(k, &mut pool).unwrap(), Some(v));
    }
    assert_eq!(reader.find(131_328, &mut pool).unwrap(), None);
}

#[test]
fn empty_sst_reports_zero_entries_and_finds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    BTreeSstWriter::write(&path, &[], None).unwrap();

    let reader = BTreeSstReader::open(&path).unwrap();
    let mut pool = pool();
    assert_eq!(reader.total_entries(), 0);
    assert_eq!(reader.find(0, &mut pool).unwrap(), None);
    assert!(reader.scan(0, u64::MAX, &mut pool).unwrap().is_empty());
}
