//! # Engine - RiptideKV-U64 Storage Engine
//!
//! [`Store`] is the facade the rest of the world talks to: it ties the
//! [`memtable`] write buffer, an [`lsm::LsmTree`] (when configured) or a
//! flat list of legacy SSTs, and the shared [`pagecache::BufferPool`] all
//! SST reads are routed through, into the single open/put/get/update/
//! delete/scan/close surface described by `config::StoreConfig`.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                    STORE                      │
//! │                                               │
//! │ write.rs → Memtable insert                    │
//! │              |                                │
//! │              |  (memtable full?)              │
//! │              v                                │
//! │           flush() → LSM tree  (LSM mode)      │
//! │                    → new flat SST (else)      │
//! │                                               │
//! │ read.rs  → Memtable → LSM tree / flat SSTs    │
//! │            (freshest wins, tombstones mask)   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module      | Purpose                                              |
//! |-------------|-------------------------------------------------------|
//! | [`lib.rs`]  | `Store` struct, constructor, accessors, `Drop`        |
//! | [`recovery`]| Directory discovery on `open`                         |
//! | [`write`]   | `put`, `update`, `delete`, internal `flush`           |
//! | [`read`]    | `get`, `scan`                                         |
//! | [`error`]   | [`StoreError`] taxonomy                               |
//!
//! ## LSM mode vs. flat mode
//!
//! A store with `config.lsm` bound is in *LSM mode*: writes route through
//! an [`lsm::LsmTree`], `update`/`delete` are legal, and `delete` is
//! `put(key, TOMBSTONE)`. Without it, the store keeps a flat, append-only
//! list of SSTs with no compaction; `update`/`delete` report
//! [`StoreError::Misuse`].
mod error;
mod read;
mod recovery;
mod write;

pub use error::StoreError;

use config::{BufferPoolConfig, EvictionKind, SearchMode, StoreConfig};
use lsm::LsmTree;
use memtable::Memtable;
use pagecache::{BufferPool, Clock, EvictionPolicy, Lru};
use std::path::{Path, PathBuf};

/// The storage engine facade: memtable, optional LSM tree or flat SST
/// list, and the buffer pool every SST read goes through.
///
/// # Write path
///
/// 1. Try `memtable.put`.
/// 2. If rejected (full), drain the memtable and flush it — to the LSM
///    tree's level 0 in LSM mode, or to a new flat SST otherwise — then
///    retry the put against the now-empty memtable.
///
/// # Read path
///
/// 1. Check the memtable (freshest, may hold a tombstone).
/// 2. Miss: consult the LSM tree (youngest level first) or walk the flat
///    SST list newest to oldest.
/// 3. A `TOMBSTONE` anywhere along the path is reported as absent.
pub struct Store {
    pub(crate) dir: PathBuf,
    pub(crate) memtable: Memtable,
    pub(crate) pool: BufferPool,
    pub(crate) lsm: Option<LsmTree>,
    /// Non-LSM mode only: flat SSTs newest-first.
    pub(crate) flat_ssts: Vec<PathBuf>,
    pub(crate) next_seq: u64,
    pub(crate) memtable_max_entries: usize,
    /// Fixed for the store's lifetime. Ignored in LSM mode, which always
    /// uses the B-tree format (`StoreConfig::validate` enforces this).
    pub(crate) search_mode: SearchMode,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("dir", &self.dir)
            .field("memtable_entries", &self.memtable.size())
            .field("lsm_mode", &self.lsm.is_some())
            .field("flat_sst_count", &self.flat_ssts.len())
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

impl Store {
    /// Opens (or creates) a store rooted at `dir` under `cfg`.
    ///
    /// Ensures the directory exists, then delegates to [`recovery`] to
    /// either discover existing flat SSTs (non-LSM mode, ordered by
    /// filename) or start a fresh [`LsmTree`] (LSM mode — reopening an
    /// existing LSM-mode directory is not supported; see `DESIGN.md`
    /// Open Question O1).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Misuse`] if `cfg.validate()` rejects the
    /// configuration, or [`StoreError::Io`] if the directory cannot be
    /// created or an existing SST cannot be opened.
    pub fn open<P: AsRef<Path>>(dir: P, cfg: StoreConfig) -> Result<Self, StoreError> {
        cfg.validate().map_err(|e| StoreError::Misuse(e.to_string()))?;

        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let pool_cfg = cfg.buffer_pool.unwrap_or_default();
        let pool = build_pool(&pool_cfg);

        let mut store = Self {
            dir,
            memtable: Memtable::new(cfg.memtable_max_entries),
            pool,
            lsm: None,
            flat_ssts: Vec::new(),
            next_seq: 0,
            memtable_max_entries: cfg.memtable_max_entries,
            search_mode: cfg.search_mode,
        };

        recovery::discover(&mut store, &cfg)?;
        Ok(store)
    }

    /// Flushes any pending memtable contents, then drops the store's
    /// handles. Safe to call more than once; a second call is a no-op
    /// since the memtable is empty after the first.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.flush_if_nonempty()
    }

    /// Number of distinct keys currently buffered in the memtable.
    #[must_use]
    pub fn memtable_len(&self) -> usize {
        self.memtable.size()
    }

    /// `true` if the store routes writes through an [`LsmTree`].
    #[must_use]
    pub fn is_lsm_mode(&self) -> bool {
        self.lsm.is_some()
    }

    pub(crate) fn next_flat_path(&mut self) -> PathBuf {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.dir.join(format!("{seq}.sst"))
    }
}

fn build_pool(cfg: &BufferPoolConfig) -> BufferPool {
    let (min_size, max_size) = cfg.rounded();
    let eviction: Box<dyn EvictionPolicy> = match cfg.eviction {
        EvictionKind::Lru => Box::new(Lru::new()),
        EvictionKind::Clock => Box::new(Clock::new()),
    };
    BufferPool::new(min_size, max_size, cfg.bucket_max_size, eviction)
}

/// Best-effort flush on drop: a store dropped without an explicit
/// `close()` still persists its buffered writes. Errors are swallowed
/// since `Drop` cannot propagate them.
impl Drop for Store {
    fn drop(&mut self) {
        let _ = self.flush_if_nonempty();
    }
}
