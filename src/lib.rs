//! # B+ Tree Index
//!
//! A persistent, disk-resident B+ tree index mapping signed 64-bit keys to
//! 64-bit record offsets. It is meant to serve as the primary-key index of
//! a larger database: given a key, it returns the byte offset of the
//! corresponding row in an external data file using a small, bounded
//! number of page reads, independent of table size. What an offset points
//! at is opaque to the index.
//!
//! ## Architecture
//!
//! The crate is composed of two layers over a single index file:
//!
//! - **Pager** (`storage`): treats the file as a growable array of
//!   4096-byte pages and mediates all disk I/O. Page 0 is a metadata page
//!   recording the file format, the branching factor, and the current
//!   root; every write is flushed to stable storage before it returns.
//! - **B+ Tree** (`btree`): one node per page, inter-node references by
//!   page id, leaves linked in key order for range scans. Lookup, range
//!   scan, and insertion with recursive splitting up to root promotion.
//!
//! There is no page cache and no write-ahead log: every traversal
//! re-reads pages, and a crash between the writes of a multi-page
//! operation can leave the structure inconsistent. A single accessor at a
//! time is assumed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bptree_index::{Config, Index};
//!
//! let index = Index::open(Config::new("table.idx").degree(64))?;
//!
//! // Map a primary key to the row's byte offset in the data file.
//! index.insert(42, 8192)?;
//!
//! // Point lookup.
//! let offset = index.get(42)?;
//!
//! // Ordered range scan, both bounds inclusive.
//! for offset in index.range(10, 99)? {
//!     println!("row at {}", offset);
//! }
//! ```

pub mod btree;
pub mod error;
pub mod page;
pub mod storage;
pub mod types;

pub use error::{IndexError, Result};
pub use types::{PageId, TreeConfig, MAX_DEGREE, MIN_DEGREE, PAGE_SIZE};

// Re-export main public API
pub use btree::{BPlusTree, Cursor, TreeStats};
pub use storage::Pager;

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

/// Index configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the index file
    pub path: PathBuf,
    /// Tree configuration (branching factor)
    pub tree: TreeConfig,
    /// Whether each page write is flushed to stable storage before it
    /// returns (default: true)
    pub sync_on_write: bool,
}

impl Config {
    /// Create a new configuration with default settings
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            tree: TreeConfig::default(),
            sync_on_write: true,
        }
    }

    /// Set the branching factor used when creating a new file
    ///
    /// An existing file keeps the degree it was created with.
    pub fn degree(mut self, degree: usize) -> Self {
        self.tree = TreeConfig::new(degree);
        self
    }

    /// Set the tree configuration
    pub fn tree_config(mut self, tree: TreeConfig) -> Self {
        self.tree = tree;
        self
    }

    /// Toggle per-write durability
    ///
    /// Turning this off trades the crash contract for throughput.
    pub fn sync_on_write(mut self, enabled: bool) -> Self {
        self.sync_on_write = enabled;
        self
    }
}

/// Index statistics
#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    /// Total number of pages in the file, metadata page included
    pub page_count: i64,
    /// Number of pages on the path from the root to a leaf
    pub height: usize,
    /// Branching factor of the tree
    pub degree: usize,
}

/// Main index handle
///
/// This is the primary public interface of the crate: a thin,
/// shareable wrapper around the tree and its pager.
pub struct Index {
    tree: Arc<RwLock<BPlusTree>>,
    pager: Arc<Pager>,
    config: Config,
}

impl Index {
    /// Open or create an index at the configured path
    pub fn open(config: Config) -> Result<Self> {
        let pager = Arc::new(Pager::open(
            &config.path,
            config.tree.degree,
            config.sync_on_write,
        )?);
        let tree = Arc::new(RwLock::new(BPlusTree::open(pager.clone())?));

        Ok(Self {
            tree,
            pager,
            config,
        })
    }

    /// Get the configuration this handle was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the branching factor of the on-disk tree
    pub fn degree(&self) -> usize {
        self.tree.read().degree()
    }

    /// Look up a key's record offset
    ///
    /// Returns `None` if the key does not exist.
    pub fn get(&self, key: i64) -> Result<Option<i64>> {
        self.tree.read().search(key)
    }

    /// Check if a key exists
    pub fn contains(&self, key: i64) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Insert a key/record-offset pair
    pub fn insert(&self, key: i64, record_offset: i64) -> Result<()> {
        self.tree.write().insert(key, record_offset)
    }

    /// Collect the record offsets of all keys in `[start, end]`, in
    /// ascending key order
    pub fn range(&self, start: i64, end: i64) -> Result<Vec<i64>> {
        self.tree.read().search_range(start, end)
    }

    /// Verify the structural invariants of the whole tree
    pub fn check(&self) -> Result<TreeStats> {
        self.tree.read().check()
    }

    /// Get statistics about the index
    pub fn stats(&self) -> Result<IndexStats> {
        let tree = self.tree.read();
        Ok(IndexStats {
            page_count: self.pager.num_pages(),
            height: tree.height()?,
            degree: tree.degree(),
        })
    }

    /// Flush the metadata page and sync all file data
    pub fn sync(&self) -> Result<()> {
        self.pager.sync()
    }
}
