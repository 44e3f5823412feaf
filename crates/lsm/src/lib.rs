//! # lsm
//!
//! The log-structured-merge storage structure sitting above `sstable`:
//! a stack of [`Level`]s, each holding at most two SSTs, merged upward
//! whenever a level overflows. `LsmTree` is what `engine::Store` drives
//! in LSM mode — it owns level bookkeeping, file naming, and cascading
//! compaction, so the store itself only has to call `flush_memtable`,
//! `get`, and `scan`.

mod level;
mod tree;

pub use level::{Level, LEVEL_SIZE_RATIO};
pub use tree::LsmTree;
