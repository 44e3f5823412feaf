//! Paged buffered I/O for streaming compaction.
//!
//! [`BufferedInput`] reads a fixed number of leaf pages at a time from a
//! [`BTreeSstReader`], handing out entries one at a time so a merge never
//! has to hold a whole SST in memory. [`BufferedOutput`] is re-exported
//! from [`crate::writer`] — it lives there next to [`BTreeSstWriter`]
//! since both share the same bottom-up finalization path.
//!
//! The buffer pool is threaded through each call rather than stored on
//! `BufferedInput`, so a merge can drive two (or more) inputs over the
//! same pool without two live mutable borrows of it.

use crate::reader::BTreeSstReader;
use anyhow::Result;
use kvcore::{Key, Value};
use pagecache::BufferPool;
use std::collections::VecDeque;

/// Sequential reader over one SST's leaf level, refilling `pages_per_read`
/// leaf pages at a time through the shared buffer pool.
pub struct BufferedInput<'a> {
    reader: &'a BTreeSstReader,
    next_leaf_index: u64,
    leaf_page_count: u64,
    pages_per_read: u64,
    buffer: VecDeque<(Key, Value)>,
    exhausted: bool,
}

impl<'a> BufferedInput<'a> {
    #[must_use]
    pub fn new(reader: &'a BTreeSstReader, pages_per_read: usize) -> Self {
        Self {
            reader,
            next_leaf_index: 0,
            leaf_page_count: reader.leaf_page_count(),
            pages_per_read: pages_per_read.max(1) as u64,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn refill(&mut self, pool: &mut BufferPool) -> Result<()> {
        if self.exhausted {
            return Ok(());
        }
        let batch_end = (self.next_leaf_index + self.pages_per_read).min(self.leaf_page_count);
        for leaf_index in self.next_leaf_index..batch_end {
            let entries = self.reader.read_leaf(leaf_index, pool)?;
            self.buffer.extend(entries);
        }
        self.next_leaf_index = batch_end;
        if self.next_leaf_index >= self.leaf_page_count {
            self.exhausted = true;
        }
        Ok(())
    }

    /// Returns the next entry, refilling from disk as needed, or `None`
    /// once every leaf page has been consumed.
    pub fn next_pair(&mut self, pool: &mut BufferPool) -> Result<Option<(Key, Value)>> {
        if self.buffer.is_empty() {
            self.refill(pool)?;
        }
        Ok(self.buffer.pop_front())
    }
}

pub use crate::writer::BufferedOutput;

#[cfg(test)]
mod tests;
