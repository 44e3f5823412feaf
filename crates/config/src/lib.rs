//! # config
//!
//! Typed, validated configuration for a RiptideKV-U64 [`Store`](../engine/struct.Store.html):
//! memtable sizing, SST search mode, buffer pool sizing and eviction, and
//! the knobs the LSM tree's compaction path reads.
//!
//! `StoreConfig::builder()` composes sensible defaults; `validate()` rejects
//! nonsensical combinations eagerly, before a single file is touched,
//! mirroring the `anyhow::ensure!` posture the rest of the workspace uses
//! for precondition checks.

use anyhow::{ensure, Result};

/// Which SST read path a store uses.
///
/// `B_TREE_SEARCH` SSTs carry a static B-tree index (§4.4) and support LSM
/// mode. `BINARY_SEARCH` SSTs are the flat legacy format: contiguous KV
/// pairs searched page-by-page. A store's search mode is fixed for its
/// lifetime; it is not a per-call choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Flat, page-binary-search SST format. Used only outside LSM mode.
    BinarySearch,
    /// Paged B-tree SST format with fence keys and an optional bloom filter.
    BTreeSearch,
}

/// Which eviction policy a buffer pool uses to choose a victim page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionKind {
    /// Least-recently-used, via a doubly linked list.
    Lru,
    /// Second-chance clock sweep over a reference-bit ring.
    Clock,
}

/// Buffer pool sizing and eviction policy.
#[derive(Debug, Clone, Copy)]
pub struct BufferPoolConfig {
    /// Minimum page-count capacity; directory never shrinks below this.
    pub min_size: usize,
    /// Maximum page-count capacity; directory never grows above this.
    pub max_size: usize,
    /// Victim-selection policy.
    pub eviction: EvictionKind,
    /// Pages held per hash-directory bucket before it must split.
    pub bucket_max_size: usize,
}

impl BufferPoolConfig {
    /// `min_size` and `max_size` rounded down to the nearest power of two,
    /// as required for extendible-hash directory depths.
    #[must_use]
    pub fn rounded(&self) -> (usize, usize) {
        (round_down_pow2(self.min_size), round_down_pow2(self.max_size))
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            min_size: 16,
            max_size: 1024,
            eviction: EvictionKind::Lru,
            bucket_max_size: 4,
        }
    }
}

/// Compaction and bloom-filter knobs for the LSM tree.
#[derive(Debug, Clone, Copy)]
pub struct LsmConfig {
    /// Bits of bloom-filter storage budgeted per key in an SST. `10` gives
    /// roughly a 1% false-positive rate.
    pub bloom_bits_per_entry: u32,
    /// Leaf pages read at a time by the compaction input stream.
    pub input_buffer_pages: usize,
    /// Leaf pages buffered before a flush by the compaction output stream.
    pub output_buffer_pages: usize,
    /// SST count at which a level overflows and must merge into the next.
    /// Fixed at 2 by this design; changing it requires revisiting the
    /// level and compaction semantics, not just this constant.
    pub size_ratio: usize,
}

impl Default for LsmConfig {
    fn default() -> Self {
        Self {
            bloom_bits_per_entry: 10,
            input_buffer_pages: 16,
            output_buffer_pages: 16,
            size_ratio: 2,
        }
    }
}

/// Full configuration bound at store construction.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Upper bound on memtable size, in distinct KV pairs.
    pub memtable_max_entries: usize,
    /// Which SST read path the store uses.
    pub search_mode: SearchMode,
    /// Buffer pool sizing and eviction, if the store uses one.
    pub buffer_pool: Option<BufferPoolConfig>,
    /// LSM tree knobs. Present iff the store is in LSM mode.
    pub lsm: Option<LsmConfig>,
}

impl StoreConfig {
    /// Starts a [`StoreConfigBuilder`] with the crate's defaults.
    #[must_use]
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// `true` if an [`LsmConfig`] is bound, i.e. the store routes
    /// Put/Update/Delete through the LSM tree instead of flat SSTs.
    #[must_use]
    pub fn is_lsm_mode(&self) -> bool {
        self.lsm.is_some()
    }

    /// Rejects nonsensical configuration eagerly, before `open()` touches
    /// the filesystem.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.memtable_max_entries > 0,
            "memtable_max_entries must be > 0"
        );

        if let Some(bp) = &self.buffer_pool {
            ensure!(bp.min_size > 0, "buffer_pool.min_size must be > 0");
            ensure!(
                bp.max_size >= bp.min_size,
                "buffer_pool.max_size must be >= buffer_pool.min_size"
            );
        }

        if let Some(lsm) = &self.lsm {
            ensure!(
                lsm.bloom_bits_per_entry >= 1,
                "lsm.bloom_bits_per_entry must be >= 1"
            );
            ensure!(
                lsm.input_buffer_pages > 0,
                "lsm.input_buffer_pages must be > 0"
            );
            ensure!(
                lsm.output_buffer_pages > 0,
                "lsm.output_buffer_pages must be > 0"
            );
            ensure!(lsm.size_ratio == 2, "lsm.size_ratio is fixed at 2");
            ensure!(
                matches!(self.search_mode, SearchMode::BTreeSearch),
                "LSM mode requires search_mode = B_TREE_SEARCH"
            );
        }

        Ok(())
    }
}

/// Builder for [`StoreConfig`]. Defaults to a small, non-LSM, B-tree-search
/// store with no buffer pool, suitable for tests; production callers
/// typically set `lsm(..)` and `buffer_pool(..)` explicitly.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfigBuilder {
    memtable_max_entries: usize,
    search_mode: SearchMode,
    buffer_pool: Option<BufferPoolConfig>,
    lsm: Option<LsmConfig>,
}

impl Default for StoreConfigBuilder {
    fn default() -> Self {
        Self {
            memtable_max_entries: 1024,
            search_mode: SearchMode::BTreeSearch,
            buffer_pool: None,
            lsm: None,
        }
    }
}

impl StoreConfigBuilder {
    #[must_use]
    pub fn memtable_max_entries(mut self, n: usize) -> Self {
        self.memtable_max_entries = n;
        self
    }

    #[must_use]
    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    #[must_use]
    pub fn buffer_pool(mut self, cfg: BufferPoolConfig) -> Self {
        self.buffer_pool = Some(cfg);
        self
    }

    #[must_use]
    pub fn lsm(mut self, cfg: LsmConfig) -> Self {
        self.lsm = Some(cfg);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<StoreConfig> {
        let cfg = StoreConfig {
            memtable_max_entries: self.memtable_max_entries,
            search_mode: self.search_mode,
            buffer_pool: self.buffer_pool,
            lsm: self.lsm,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

fn round_down_pow2(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    1usize << (usize::BITS - 1 - n.leading_zeros())
}

#[cfg(test)]
mod tests;
