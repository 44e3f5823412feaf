//! [`StoreError`]: the taxonomy a [`crate::Store`] call can fail with.
//!
//! Absent is not represented here at all — it is `Option::None` from `get`
//! or an empty contribution to `scan`. Everything below this module speaks
//! `anyhow::Result`, the same posture the rest of the workspace takes;
//! `Store`'s public surface is the one place that narrows down to a typed
//! error.

use thiserror::Error;

/// Error returned by a [`crate::Store`] operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `update`/`delete` called on a non-LSM store, or a value supplied to
    /// `put`/`update` collides with a reserved sentinel.
    #[error("misuse: {0}")]
    Misuse(String),

    /// A filesystem operation failed outright (directory creation, rename,
    /// read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lower layer (`sstable`, `lsm`, `pagecache`) failed in a way that
    /// should not occur in a correctly sized, uncorrupted store — e.g. the
    /// buffer pool's directory is full and has nothing left to evict.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<std::io::Error>() {
            Ok(io_err) => StoreError::Io(io_err),
            Err(err) => StoreError::Internal(err.to_string()),
        }
    }
}
