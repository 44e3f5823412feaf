//! Heap-based merge of multiple sorted, fallible key/value sources.
//!
//! Produces `(key, value)` pairs in ascending key order. When the same
//! key appears in more than one source, only the entry from the source
//! with the highest rank is emitted (newest wins) — the others are
//! silently dropped, including whatever value they carried, tombstone or
//! not. Retention decisions (e.g. dropping a tombstone once it reaches
//! the last level) are the caller's to make, not this iterator's.
//!
//! The buffer pool is passed into every call rather than captured by the
//! sources, so a merge can drive several [`crate::bufio::BufferedInput`]
//! sources over the same pool without conflicting mutable borrows.

use anyhow::Result;
use kvcore::{Key, Value};
use pagecache::BufferPool;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A fallible source of ascending `(key, value)` pairs, implemented by
/// [`crate::bufio::BufferedInput`].
pub trait PairSource {
    fn next_pair(&mut self, pool: &mut BufferPool) -> Result<Option<(Key, Value)>>;
}

impl<'a> PairSource for crate::bufio::BufferedInput<'a> {
    fn next_pair(&mut self, pool: &mut BufferPool) -> Result<Option<(Key, Value)>> {
        crate::bufio::BufferedInput::next_pair(self, pool)
    }
}

struct HeapEntry {
    key: Key,
    value: Value,
    rank: usize,
    source: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.rank == other.rank
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the greatest element; reverse the key compare so
        // the smallest key surfaces first, and break ties in favor of the
        // higher rank (the newer source) so it surfaces before any older
        // duplicate of the same key.
        other.key.cmp(&self.key).then_with(|| self.rank.cmp(&other.rank))
    }
}

/// Merges `sources` (ordered oldest to newest) into one ascending stream,
/// keeping only the newest value for each key.
pub struct MergeIterator<S: PairSource> {
    sources: Vec<S>,
    heap: BinaryHeap<HeapEntry>,
}

impl<S: PairSource> MergeIterator<S> {
    pub fn new(mut sources: Vec<S>, pool: &mut BufferPool) -> Result<Self> {
        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (rank, source) in sources.iter_mut().enumerate() {
            if let Some((key, value)) = source.next_pair(pool)? {
                heap.push(HeapEntry {
                    key,
                    value,
                    rank,
                    source: rank,
                });
            }
        }
        Ok(Self { sources, heap })
    }

    /// Returns the next merged entry, or `None` once every source is
    /// exhausted.
    pub fn next_pair(&mut self, pool: &mut BufferPool) -> Result<Option<(Key, Value)>> {
        let Some(top) = self.heap.pop() else {
            return Ok(None);
        };
        if let Some((k, v)) = self.sources[top.source].next_pair(pool)? {
            self.heap.push(HeapEntry {
                key: k,
                value: v,
                rank: top.source,
                source: top.source,
            });
        }

        while let Some(next_top) = self.heap.peek() {
            if next_top.key != top.key {
                break;
            }
            let dup = self.heap.pop().unwrap();
            if let Some((k, v)) = self.sources[dup.source].next_pair(pool)? {
                self.heap.push(HeapEntry {
                    key: k,
                    value: v,
                    rank: dup.source,
                    source: dup.source,
                });
            }
        }

        Ok(Some((top.key, top.value)))
    }
}
