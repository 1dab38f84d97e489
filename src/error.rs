//! Error types for the index.

use crate::types::PageId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur in the index
#[derive(Error, Debug)]
pub enum IndexError {
    /// Branching factor below the minimum of 3
    #[error("degree {degree} is too small (minimum is 3)")]
    DegreeTooSmall { degree: usize },

    /// Branching factor too large for an internal node to fit in one page
    #[error("degree {degree} is too large (maximum is {max})")]
    DegreeTooLarge { degree: usize, max: usize },

    /// The index file could not be opened or created
    #[error("failed to open index file {}: {source}", .path.display())]
    IoOpen { path: PathBuf, source: io::Error },

    /// A page read failed (short reads included)
    #[error("failed to read page {page_id} at offset {offset}: {source}")]
    IoRead {
        page_id: PageId,
        offset: u64,
        source: io::Error,
    },

    /// A page write or flush failed
    #[error("failed to write page {page_id} at offset {offset}: {source}")]
    IoWrite {
        page_id: PageId,
        offset: u64,
        source: io::Error,
    },

    /// Requested page id lies beyond the end of the file
    #[error("page {page_id} is past the end of the file ({num_pages} pages)")]
    ReadPastEnd { page_id: PageId, num_pages: i64 },

    /// Insert called with a key that is already present
    #[error("duplicate key {key}")]
    DuplicateKey { key: i64 },

    /// On-disk structure failed validation (bad node bytes, broken invariant)
    #[error("corruption detected: {0}")]
    Corruption(String),

    /// The file is not an index file this crate understands
    #[error("invalid index file: {0}")]
    InvalidIndexFile(String),

    /// Invalid operation for the current state
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl IndexError {
    /// Create a corruption error with a message
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create an invalid index file error
    pub fn invalid_file(msg: impl Into<String>) -> Self {
        Self::InvalidIndexFile(msg.into())
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}
