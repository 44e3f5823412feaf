//! Read path: `get` and `scan`.
//!
//! Point lookups check the memtable first (freshest, may hold a
//! tombstone), then the LSM tree or the flat SST list newest to oldest.
//! Range scans merge every source into an ordered map, freshest writer
//! last, then drop tombstones from the final result.

use crate::{Store, StoreError};
use config::SearchMode;
use kvcore::{Key, Value, INVALID, TOMBSTONE};
use pagecache::BufferPool;
use sstable::{BTreeSstReader, FlatSstReader};
use std::collections::BTreeMap;
use std::path::Path;

/// Opens whichever flat-mode SST format the store is bound to.
enum FlatReader {
    Flat(FlatSstReader),
    BTree(BTreeSstReader),
}

impl FlatReader {
    fn open(path: &Path, mode: SearchMode) -> Result<Self, StoreError> {
        Ok(match mode {
            SearchMode::BinarySearch => FlatReader::Flat(FlatSstReader::open(path)?),
            SearchMode::BTreeSearch => FlatReader::BTree(BTreeSstReader::open(path)?),
        })
    }

    fn find(&self, k: Key, pool: &mut BufferPool) -> Result<Option<Value>, StoreError> {
        Ok(match self {
            FlatReader::Flat(r) => r.find(k, pool)?,
            FlatReader::BTree(r) => r.find(k, pool)?,
        })
    }

    fn scan(&self, k1: Key, k2: Key, pool: &mut BufferPool) -> Result<Vec<(Key, Value)>, StoreError> {
        Ok(match self {
            FlatReader::Flat(r) => r.scan(k1, k2, pool)?,
            FlatReader::BTree(r) => r.scan(k1, k2, pool)?,
        })
    }
}

impl Store {
    /// Looks up `k`.
    ///
    /// Returns `Ok(None)` both when `k` was never written and when the
    /// most recent write for `k` was a tombstone — `spec.md`'s "Absent"
    /// taxonomy does not distinguish the two from the caller's side.
    ///
    /// # Errors
    ///
    /// Returns an error if reading an SST fails.
    pub fn get(&mut self, k: Key) -> Result<Option<Value>, StoreError> {
        let mem_value = self.memtable.get(k);
        if mem_value != INVALID {
            return Ok(resolve(mem_value));
        }

        if let Some(lsm) = &self.lsm {
            return Ok(lsm.get(k, &mut self.pool)?);
        }

        for path in &self.flat_ssts {
            let reader = FlatReader::open(path, self.search_mode)?;
            if let Some(value) = reader.find(k, &mut self.pool)? {
                return Ok(resolve(value));
            }
        }
        Ok(None)
    }

    /// Inclusive range scan over `[k1, k2]`, ascending by key.
    ///
    /// Builds an ordered map from oldest source to newest so a later
    /// insert always overrides an earlier one, then drops any surviving
    /// tombstone before returning — `lsm.scan` already resolves shadowing
    /// across levels, so only the memtable's own contribution (possibly
    /// including tombstones newer than anything flushed) needs a second
    /// pass here.
    ///
    /// # Errors
    ///
    /// Returns an error if reading an SST fails. `k1 > k2` yields an
    /// empty result rather than an error.
    pub fn scan(&mut self, k1: Key, k2: Key) -> Result<Vec<(Key, Value)>, StoreError> {
        if k1 > k2 {
            return Ok(Vec::new());
        }

        let mut merged: BTreeMap<Key, Value> = BTreeMap::new();

        if let Some(lsm) = &self.lsm {
            for (k, v) in lsm.scan(k1, k2, &mut self.pool)? {
                merged.insert(k, v);
            }
        } else {
            for path in self.flat_ssts.iter().rev() {
                let reader = FlatReader::open(path, self.search_mode)?;
                for (k, v) in reader.scan(k1, k2, &mut self.pool)? {
                    merged.insert(k, v);
                }
            }
        }

        for (k, v) in self.memtable.scan(k1, k2) {
            merged.insert(k, v);
        }

        Ok(merged.into_iter().filter(|&(_, v)| v != TOMBSTONE).collect())
    }
}

fn resolve(value: Value) -> Option<Value> {
    if value == TOMBSTONE {
        None
    } else {
        Some(value)
    }
}
