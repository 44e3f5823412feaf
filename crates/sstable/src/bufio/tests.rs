use super::*;
use crate::writer::BTreeSstWriter;
use pagecache::{BufferPool, Lru};

fn pool() -> BufferPool {
    BufferPool::new(4, 64, 8, Box::new(Lru::new()))
}

#[test]
fn buffered_input_yields_all_entries_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    let entries: Vec<(Key, Value)> = (0..10_000u64).map(|k| (k, k)).collect();
    BTreeSstWriter::write(&path, &entries, None).unwrap();

    let reader = BTreeSstReader::open(&path).unwrap();
    let mut pool = pool();
    let mut input = BufferedInput::new(&reader, 4);

    let mut got = Vec::new();
    while let Some(pair) = input.next_pair(&mut pool).unwrap() {
        got.push(pair);
    }
    assert_eq!(got, entries);
}

#[test]
fn buffered_input_on_empty_sst_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    BTreeSstWriter::write(&path, &[], None).unwrap();

    let reader = BTreeSstReader::open(&path).unwrap();
    let mut pool = pool();
    let mut input = BufferedInput::new(&reader, 4);
    assert_eq!(input.next_pair(&mut pool).unwrap(), None);
}

#[test]
fn buffered_input_refill_size_does_not_affect_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.sst");
    let entries: Vec<(Key, Value)> = (0..3000u64).map(|k| (k, k * 9)).collect();
    BTreeSstWriter::write(&path, &entries, None).unwrap();
    let reader = BTreeSstReader::open(&path).unwrap();

    for pages_per_read in [1, 2, 100] {
        let mut pool = pool();
        let mut input = BufferedInput::new(&reader, pages_per_read);
        let mut got = Vec::new();
        while let Some(pair) = input.next_pair(&mut pool).unwrap() {
            got.push(pair);
        }
        assert_eq!(got, entries);
    }
}

#[test]
fn two_buffered_inputs_can_share_one_pool() {
    let dir = tempfile::tempdir().unwrap();
    let path_a = dir.path().join("a.sst");
    let path_b = dir.path().join("b.sst");
    BTreeSstWriter::write(&path_a, &[(1, 1), (3, 3)], None).unwrap();
    BTreeSstWriter::write(&path_b, &[(2, 2), (4, 4)], None).unwrap();

    let reader_a = BTreeSstReader::open(&path_a).unwrap();
    let reader_b = BTreeSstReader::open(&path_b).unwrap();
    let mut pool = pool();
    let mut a = BufferedInput::new(&reader_a, 4);
    let mut b = BufferedInput::new(&reader_b, 4);

    assert_eq!(a.next_pair(&mut pool).unwrap(), Some((1, 1)));
    assert_eq!(b.next_pair(&mut pool).unwrap(), Some((2, 2)));
    assert_eq!(a.next_pair(&mut pool).unwrap(), Some((3, 3)));
    assert_eq!(b.next_pair(&mut pool).unwrap(), Some((4, 4)));
}
