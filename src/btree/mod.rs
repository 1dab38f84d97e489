//! B+ tree implementation.
//!
//! This module provides a disk-resident B+ tree that supports:
//! - Point lookups (search)
//! - Insertions with recursive splitting (insert)
//! - Ordered range scans over the leaf chain (search_range, Cursor)
//! - Integrity verification (check)

mod cursor;
mod tree;

pub use cursor::Cursor;
pub use tree::{BPlusTree, TreeStats};
