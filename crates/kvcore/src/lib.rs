//! # kvcore
//!
//! Shared primitives for the RiptideKV-U64 storage engine: the key/value
//! type aliases, the two reserved sentinel values, and the page geometry
//! constants that every other crate in the workspace (`bloom`, `memtable`,
//! `pagecache`, `sstable`, `lsm`, `engine`) agrees on.
//!
//! Keeping these in one place means the on-disk page layout (`sstable`) and
//! the in-memory structures (`memtable`, `lsm`) can never drift apart on
//! what a "key", a "value", or a "page" is.

/// A 64-bit unsigned lookup key.
pub type Key = u64;

/// A 64-bit unsigned stored value.
pub type Value = u64;

/// Reserved sentinel meaning "absent" — never a legal user value.
pub const INVALID: Value = u64::MAX;

/// Reserved sentinel marking a deleted key (masks older versions on read).
/// Never a legal user value.
pub const TOMBSTONE: Value = u64::MAX - 1;

/// Returns `true` if `value` is a reserved sentinel and therefore not a
/// legal user-supplied value.
#[must_use]
pub fn is_sentinel(value: Value) -> bool {
    value == INVALID || value == TOMBSTONE
}

/// Validates a value supplied by a caller (`Store::put`/`Store::update`).
///
/// # Errors
///
/// Returns an error if `value >= TOMBSTONE`, i.e. the value collides with a
/// reserved sentinel.
pub fn check_user_value(value: Value) -> Result<(), InvalidValueError> {
    if value >= TOMBSTONE {
        return Err(InvalidValueError(value));
    }
    Ok(())
}

/// Error returned when a caller-supplied value collides with a reserved
/// sentinel (`value >= TOMBSTONE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidValueError(pub Value);

impl std::fmt::Display for InvalidValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "value {} collides with a reserved sentinel (must be < {})",
            self.0, TOMBSTONE
        )
    }
}

impl std::error::Error for InvalidValueError {}

/// Bytes in one on-disk page. All SST I/O is page-sized and page-aligned.
pub const PAGE_SIZE: usize = 4096;

/// Bytes occupied by one encoded KV pair (key + value, 8 bytes LE each).
pub const KV_PAIR_BYTES: usize = 16;

/// Maximum KV pairs that fit in one leaf page (`PAGE_SIZE / KV_PAIR_BYTES`).
pub const KV_PER_LEAF_PAGE: usize = PAGE_SIZE / KV_PAIR_BYTES;

/// Maximum fence keys (u64s) that fit in one internal B-tree page
/// (`PAGE_SIZE / 8`).
pub const KEYS_PER_INTERNAL_PAGE: usize = PAGE_SIZE / 8;

/// Constructs the buffer-pool page identity for a given SST path and page
/// index, as specified: `sst-path + "-" + page-index`.
#[must_use]
pub fn page_id(sst_path: &str, page_index: u64) -> String {
    format!("{sst_path}-{page_index}")
}
