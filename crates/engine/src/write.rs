//! Write path: `put`, `update`, `delete`, and the internal flush that
//! drains the memtable into the LSM tree or a new flat SST.

use crate::{Store, StoreError};
use config::SearchMode;
use kvcore::{check_user_value, Key, Value, TOMBSTONE};
use memtable::PutResult;
use sstable::{BTreeSstWriter, FlatSstWriter};

impl Store {
    /// Inserts `(k, v)`.
    ///
    /// Tries `memtable.put` first; if the memtable is already full, drains
    /// and flushes it (to the LSM tree's level 0, or to a new flat SST),
    /// resets it, then retries — a retry after a fresh flush always
    /// succeeds, since a just-cleared memtable cannot itself be full.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Misuse`] if `v` collides with a reserved
    /// sentinel (`v >= TOMBSTONE`), or an I/O or internal error from the
    /// flush path.
    pub fn put(&mut self, k: Key, v: Value) -> Result<(), StoreError> {
        check_user_value(v).map_err(|e| StoreError::Misuse(e.to_string()))?;
        self.put_raw(k, v)
    }

    /// `update(k, v)`: legal only in LSM mode, otherwise identical to
    /// [`put`](Self::put).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Misuse`] on a non-LSM store.
    pub fn update(&mut self, k: Key, v: Value) -> Result<(), StoreError> {
        if self.lsm.is_none() {
            return Err(StoreError::Misuse(
                "update is only legal in LSM mode".into(),
            ));
        }
        self.put(k, v)
    }

    /// `delete(k)`: legal only in LSM mode, encoded as `put(k, TOMBSTONE)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Misuse`] on a non-LSM store.
    pub fn delete(&mut self, k: Key) -> Result<(), StoreError> {
        if self.lsm.is_none() {
            return Err(StoreError::Misuse(
                "delete is only legal in LSM mode".into(),
            ));
        }
        self.put_raw(k, TOMBSTONE)
    }

    /// Shared by `put` and `delete` (which writes a raw `TOMBSTONE` value
    /// that `check_user_value` would otherwise reject).
    fn put_raw(&mut self, k: Key, v: Value) -> Result<(), StoreError> {
        if self.memtable.put(k, v) == PutResult::Rejected {
            self.flush_if_nonempty()?;
            let retried = self.memtable.put(k, v);
            debug_assert_eq!(retried, PutResult::Accepted, "freshly reset memtable cannot reject");
        }
        Ok(())
    }

    /// Drains and flushes the memtable if it holds anything, otherwise a
    /// no-op. Called on memtable overflow, on [`Store::close`], and on
    /// `Drop`.
    pub(crate) fn flush_if_nonempty(&mut self) -> Result<(), StoreError> {
        if self.memtable.is_empty() {
            return Ok(());
        }
        let sorted = self.memtable.drain_sorted();

        if let Some(lsm) = &mut self.lsm {
            lsm.flush_memtable(&sorted, &mut self.pool)?;
        } else {
            let path = self.next_flat_path();
            match self.search_mode {
                SearchMode::BinarySearch => FlatSstWriter::write(&path, &sorted)?,
                SearchMode::BTreeSearch => BTreeSstWriter::write(&path, &sorted, None)?,
            }
            self.flat_ssts.insert(0, path);
        }
        Ok(())
    }
}
