//! # sstable
//!
//! Immutable, on-disk storage files for the RiptideKV-U64 storage engine.
//!
//! When a [`memtable::Memtable`] is flushed, or when compaction merges
//! existing SSTs, the result is one of two page-based formats:
//!
//! - **B-tree format** ([`BTreeSstWriter`]/[`BTreeSstReader`]), used in
//!   LSM mode: a paged B-tree over fence keys, with an embedded bloom
//!   filter for fast negative point lookups. Built bottom-up — leaf
//!   pages stream to disk as input arrives, only the fence-key index is
//!   held in memory, and the metadata page is written last.
//! - **Flat format** ([`FlatSstWriter`]/[`FlatSstReader`]), used in
//!   non-LSM mode: contiguous sorted KV pages with no index, searched by
//!   binary search over the page range itself.
//!
//! Every page — metadata, internal, leaf — is exactly `kvcore::PAGE_SIZE`
//! bytes. All multi-byte integers are little-endian. An SST is
//! write-once: once created it is never modified, only replaced wholesale
//! by compaction.
//!
//! ## Page addressing
//!
//! Page 0 is always the metadata page. Readers keep no open file handle
//! between calls — every page read is addressed by the `(sst-path,
//! page-index)` identity from `kvcore::page_id` and routed through a
//! caller-supplied `pagecache::BufferPool`, which may already hold the
//! page from an earlier call.

mod bufio;
mod format;
mod merge;
mod reader;
mod writer;

pub use bufio::BufferedInput;
pub use format::{
    decode_internal_page, decode_leaf_page, encode_internal_page, encode_leaf_page, BTreeMetadata,
    FlatMetadata, BTREE_MAGIC, FLAT_MAGIC,
};
pub use merge::{MergeIterator, PairSource};
pub use reader::{BTreeSstReader, FlatSstReader};
pub use writer::{BTreeSstWriter, BufferedOutput, FlatSstWriter};
