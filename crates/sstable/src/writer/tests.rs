use super::*;
use crate::format::BTreeMetadata;
use std::io::Read as _;

fn read_metadata(path: &Path) -> BTreeMetadata {
    let mut file = File::open(path).unwrap();
    let mut page0 = [0u8; PAGE_SIZE];
    file.read_exact(&mut page0).unwrap();
    BTreeMetadata::read_from(&mut &page0[..]).unwrap()
}

#[test]
fn btree_writer_produces_readable_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    let entries: Vec<(Key, Value)> = (0..5000u64).map(|k| (k, k * 2)).collect();

    BTreeSstWriter::write(&path, &entries, Some(10)).unwrap();

    let meta = read_metadata(&path);
    assert_eq!(meta.total_entries, 5000);
    assert!(meta.bloom_offset.is_some());
    assert!(meta.num_levels() >= 1);
}

#[test]
fn btree_writer_handles_single_page_with_no_internal_levels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    let entries: Vec<(Key, Value)> = (0..10u64).map(|k| (k, k)).collect();

    BTreeSstWriter::write(&path, &entries, None).unwrap();

    let meta = read_metadata(&path);
    assert_eq!(meta.num_levels(), 1);
    assert_eq!(meta.leaf_page_count, 1);
    assert_eq!(meta.bloom_offset, None);
}

#[test]
fn btree_writer_handles_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");

    BTreeSstWriter::write(&path, &[], None).unwrap();

    let meta = read_metadata(&path);
    assert_eq!(meta.total_entries, 0);
    assert_eq!(meta.leaf_page_count, 1);
}

#[test]
fn btree_writer_builds_multiple_internal_levels_for_large_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    // Enough leaves that the first internal level itself needs more than
    // one page, forcing a second internal level above it.
    let entries: Vec<(Key, Value)> = (0..(KV_PER_LEAF_PAGE as u64 * KEYS_PER_INTERNAL_PAGE as u64 * 2))
        .map(|k| (k, k))
        .collect();

    BTreeSstWriter::write(&path, &entries, None).unwrap();

    let meta = read_metadata(&path);
    assert!(meta.num_levels() >= 3, "expected root + internal + leaf levels");
}

#[test]
fn buffered_output_matches_one_shot_writer() {
    let dir = tempfile::tempdir().unwrap();
    let batch_path = dir.path().join("batch.sst");
    let streamed_path = dir.path().join("streamed.sst");
    let entries: Vec<(Key, Value)> = (0..3000u64).map(|k| (k, k + 1)).collect();

    BTreeSstWriter::write(&batch_path, &entries, Some(8)).unwrap();

    let mut out = BufferedOutput::create(&streamed_path, Some(8), entries.len() as u64, 4).unwrap();
    for &(k, v) in &entries {
        out.push(k, v).unwrap();
    }
    assert_eq!(out.entries_written(), entries.len() as u64);
    out.finish().unwrap();

    let batch_meta = read_metadata(&batch_path);
    let streamed_meta = read_metadata(&streamed_path);
    assert_eq!(batch_meta.total_entries, streamed_meta.total_entries);
    assert_eq!(batch_meta.leaf_page_count, streamed_meta.leaf_page_count);
}

#[test]
fn flat_writer_produces_readable_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flat.sst");
    let entries: Vec<(Key, Value)> = (0..1000u64).map(|k| (k, k)).collect();

    FlatSstWriter::write(&path, &entries).unwrap();

    let mut file = File::open(&path).unwrap();
    let mut page0 = [0u8; PAGE_SIZE];
    file.read_exact(&mut page0).unwrap();
    let meta = FlatMetadata::read_from(&mut &page0[..]).unwrap();
    assert_eq!(meta.total_entries, 1000);
}

#[test]
fn writer_leaves_no_tmp_file_behind_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    BTreeSstWriter::write(&path, &[(1, 2)], None).unwrap();
    let tmp = tmp_path(&path);
    assert!(!tmp.exists());
    assert!(path.exists());
}
