//! # pagecache
//!
//! The paged buffer cache sitting between the SST codec and the
//! filesystem: an extendible hash directory of cached pages, evicted
//! under a pluggable policy (LRU or CLOCK), exposed through a single
//! [`BufferPool`] facade.
//!
//! Pages are identified by the `(sst-path, page-index)` string built by
//! `kvcore::page_id`, treated here as an opaque cache key — this crate
//! never parses or interprets page bytes, that is `sstable`'s job.

mod directory;
mod eviction;
mod pool;

pub use directory::{ExtendibleHashDirectory, InsertOutcome};
pub use eviction::{Clock, EvictionPolicy, Lru};
pub use pool::{BufferPool, EXPAND_THRESHOLD};
