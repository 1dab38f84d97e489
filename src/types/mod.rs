//! Common types used throughout the index.

mod page_id;

pub use page_id::PageId;

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Size of the fixed header at the start of every tree page
pub const NODE_HEADER_SIZE: usize = 32;

/// Size of one leaf entry: key (8 bytes) plus record offset (8 bytes)
pub const LEAF_ENTRY_SIZE: usize = 16;

/// Size of an on-disk page id
pub const PAGE_ID_SIZE: usize = 8;

/// Smallest usable branching factor
pub const MIN_DEGREE: usize = 3;

/// Largest branching factor whose internal node still fits in one page.
///
/// An internal node's payload holds one leading child pointer followed by
/// `degree - 1` separator/pointer pairs of 16 bytes each.
pub const MAX_DEGREE: usize =
    (PAGE_SIZE - NODE_HEADER_SIZE - PAGE_ID_SIZE) / (8 + PAGE_ID_SIZE) + 1;

/// Check that a branching factor is usable
pub fn validate_degree(degree: usize) -> Result<()> {
    if degree < MIN_DEGREE {
        return Err(IndexError::DegreeTooSmall { degree });
    }
    if degree > MAX_DEGREE {
        return Err(IndexError::DegreeTooLarge {
            degree,
            max: MAX_DEGREE,
        });
    }
    Ok(())
}

/// Tree configuration
///
/// The degree is fixed when the index file is created and persisted in its
/// metadata page; opening an existing file uses the stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfig {
    /// Branching factor; a node holds at most `degree - 1` keys
    pub degree: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { degree: MAX_DEGREE }
    }
}

impl TreeConfig {
    /// Create a new config with the given branching factor
    pub fn new(degree: usize) -> Self {
        Self { degree }
    }
}
