//! The LSM tree itself: a stack of levels, flushed into from the memtable
//! and cascade-compacted, routing point lookups and range scans.

use crate::level::Level;
use anyhow::Result;
use config::LsmConfig;
use kvcore::{Key, Value, TOMBSTONE};
use pagecache::BufferPool;
use sstable::BTreeSstReader;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Ordered stack of [`Level`]s, level 0 youngest. After every public
/// operation no level holds 2 SSTs except mid-cascade inside that same
/// call.
pub struct LsmTree {
    dir: PathBuf,
    levels: Vec<Level>,
    next_seq: u64,
    bloom_bits_per_entry: u32,
    input_buffer_pages: usize,
    output_buffer_pages: usize,
}

impl LsmTree {
    #[must_use]
    pub fn new(dir: PathBuf, cfg: &LsmConfig) -> Self {
        let mut tree = Self {
            dir,
            levels: Vec::new(),
            next_seq: 0,
            bloom_bits_per_entry: cfg.bloom_bits_per_entry,
            input_buffer_pages: cfg.input_buffer_pages,
            output_buffer_pages: cfg.output_buffer_pages,
        };
        tree.ensure_level(0);
        tree
    }

    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    fn ensure_level(&mut self, level: usize) {
        while self.levels.len() <= level {
            let number = self.levels.len() as u32;
            self.levels.push(Level::new(
                number,
                self.bloom_bits_per_entry,
                self.input_buffer_pages,
                self.output_buffer_pages,
            ));
        }
    }

    fn next_path(&mut self, level: u32) -> PathBuf {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.dir.join(format!("level{level}-{seq}.sst"))
    }

    /// Appends `sorted_run` as a new SST in level 0, then cascades any
    /// resulting overflow upward.
    pub fn flush_memtable(&mut self, sorted_run: &[(Key, Value)], pool: &mut BufferPool) -> Result<()> {
        let path = self.next_path(0);
        self.levels[0].write_data(sorted_run, path)?;
        self.maintain(0, pool)
    }

    /// If level `level` holds 2 SSTs, merges them into level `level + 1`
    /// and recurses, cascading the overflow upward as far as it goes.
    fn maintain(&mut self, level: usize, pool: &mut BufferPool) -> Result<()> {
        if self.levels[level].sst_count() < 2 {
            return Ok(());
        }
        self.ensure_level(level + 1);
        let out_path = self.next_path(level as u32 + 1);

        let (left, right) = self.levels.split_at_mut(level + 1);
        left[level].sort_merge_into(&mut right[0], &out_path, pool)?;

        self.maintain(level + 1, pool)
    }

    /// Walks levels youngest to oldest, returning the first non-absent
    /// value. A `TOMBSTONE` at the shallowest occurrence means deleted,
    /// reported as `Ok(None)` rather than falling through to older levels.
    pub fn get(&self, key: Key, pool: &mut BufferPool) -> Result<Option<Value>> {
        for level in &self.levels {
            let Some(path) = level.ssts().first() else {
                continue;
            };
            let reader = BTreeSstReader::open(path)?;
            if let Some(value) = reader.find(key, pool)? {
                return Ok(if value == TOMBSTONE { None } else { Some(value) });
            }
        }
        Ok(None)
    }

    /// Inclusive range scan, shallowest level's value winning on
    /// overlapping keys; tombstones are dropped from the result.
    ///
    /// Reads every level's matching range and resolves overlaps with a
    /// deepest-first merge into an ordered map, which is equivalent to
    /// `spec.md`'s per-key cursor climb (each level contributes at most
    /// one SST, so there is no ordering ambiguity within a level) while
    /// reusing `sstable`'s own range scan instead of re-implementing
    /// per-SST cursor bookkeeping here.
    pub fn scan(&self, k1: Key, k2: Key, pool: &mut BufferPool) -> Result<Vec<(Key, Value)>> {
        if k1 > k2 {
            return Ok(Vec::new());
        }
        let mut merged: BTreeMap<Key, Value> = BTreeMap::new();
        for level in self.levels.iter().rev() {
            let Some(path) = level.ssts().first() else {
                continue;
            };
            let reader = BTreeSstReader::open(path)?;
            for (k, v) in reader.scan(k1, k2, pool)? {
                merged.insert(k, v);
            }
        }
        Ok(merged.into_iter().filter(|&(_, v)| v != TOMBSTONE).collect())
    }
}

#[cfg(test)]
mod tests;
