//! Buffer pool facade: the page cache the rest of the engine actually
//! talks to, combining the extendible hash directory ([`super::directory`])
//! with a pluggable eviction policy ([`super::eviction`]).

use crate::directory::{ExtendibleHashDirectory, InsertOutcome};
use crate::eviction::EvictionPolicy;

/// Fraction of directory fan-out that must be filled before `insert`
/// tries to grow the directory. Chosen at the high end of the allowed
/// 0.75-0.8 range; kept as a named constant so it is a single place to
/// retune.
pub const EXPAND_THRESHOLD: f64 = 0.75;

/// A page cache keyed by `(sst-identity, page-index)` strings (see
/// `kvcore::page_id`), backed by an extendible hash directory and an
/// injected eviction policy.
pub struct BufferPool {
    directory: ExtendibleHashDirectory,
    eviction: Box<dyn EvictionPolicy>,
    max_size: usize,
}

impl BufferPool {
    /// Creates a pool bounded between `min_size` and `max_size` pages
    /// (both expected to already be powers of two), with the given
    /// bucket fan-out and eviction policy.
    #[must_use]
    pub fn new(
        min_size: usize,
        max_size: usize,
        bucket_max_size: usize,
        eviction: Box<dyn EvictionPolicy>,
    ) -> Self {
        let min_depth = depth_of(min_size.max(1));
        let max_depth = depth_of(max_size.max(1));
        Self {
            directory: ExtendibleHashDirectory::new(min_depth, max_depth, bucket_max_size),
            eviction,
            max_size,
        }
    }

    /// Looks up `page_id`. On a hit, records the access with the eviction
    /// policy and returns a copy of the cached bytes — callers never hold
    /// a live reference into the pool past this call, since a later
    /// `insert` may evict the very page they just read.
    pub fn get(&mut self, page_id: &str) -> Option<Vec<u8>> {
        let hit = self.directory.get(page_id)?;
        self.eviction.on_access(page_id);
        Some(hit)
    }

    /// Inserts `bytes` for `page_id`, growing the directory or evicting a
    /// page first if the load factor demands it.
    pub fn insert(&mut self, page_id: &str, bytes: Vec<u8>) {
        self.maybe_grow_or_evict();

        loop {
            match self.directory.insert(page_id, bytes.clone()) {
                InsertOutcome::Inserted => break,
                InsertOutcome::NeedsExpansion => {
                    if !self.directory.expand_directory() {
                        if let Some(victim) = self.eviction.choose_victim() {
                            self.directory.remove(&victim);
                            self.eviction.remove(&victim);
                        } else {
                            // Directory full and nothing left to evict: give up
                            // rather than loop forever. The caller (engine) is
                            // expected to size the pool so this never happens.
                            break;
                        }
                    }
                }
            }
        }

        self.eviction.on_insert(page_id);
    }

    fn maybe_grow_or_evict(&mut self) {
        let threshold = self.directory.num_directory_entries() as f64 * EXPAND_THRESHOLD;
        if (self.directory.size() as f64) > threshold && !self.directory.expand_directory() {
            if let Some(victim) = self.eviction.choose_victim() {
                self.directory.remove(&victim);
                self.eviction.remove(&victim);
            }
        }
    }

    /// Removes `page_id` directly, purging it from both the directory and
    /// the eviction structure.
    pub fn remove(&mut self, page_id: &str) {
        self.directory.remove(page_id);
        self.eviction.remove(page_id);
    }

    /// Resizes the pool to `new_max` pages: evicts enough pages to bring
    /// the load factor back under the threshold, then shrinks the
    /// directory's depth ceiling.
    pub fn resize(&mut self, new_max: usize) {
        let target = (self.directory.size() as f64 - EXPAND_THRESHOLD * new_max as f64).ceil();
        let evictions = target.max(0.0) as usize;
        for _ in 0..evictions {
            match self.eviction.choose_victim() {
                Some(victim) => {
                    self.directory.remove(&victim);
                    self.eviction.remove(&victim);
                }
                None => break,
            }
        }

        let new_max_depth = depth_of(new_max.max(1));
        while self.directory.global_depth() > new_max_depth {
            self.directory.shrink_directory();
        }
        self.directory.set_max_depth(new_max_depth);
        self.max_size = new_max;
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.directory.size()
    }
}

/// Largest `d` such that `2^d <= n`.
fn depth_of(n: usize) -> u32 {
    usize::BITS - 1 - n.max(1).leading_zeros()
}

#[cfg(test)]
mod tests;
