//! B+ tree cursor for ordered iteration.
//!
//! The cursor holds one leaf page and an entry index into it. Moving
//! past the last entry of a leaf follows the `next_leaf` link, so a full
//! scan touches each leaf exactly once and never re-descends from the
//! root.

use crate::btree::tree::find_leaf;
use crate::error::Result;
use crate::page::Node;
use crate::storage::Pager;
use crate::types::PageId;

/// A cursor over leaf entries in ascending key order
pub struct Cursor<'a> {
    /// Pager for following the leaf chain
    pager: &'a Pager,
    /// Buffer holding the current leaf
    node: Node,
    /// Entry index into the current leaf
    entry: usize,
    /// Whether the cursor is positioned at a live entry
    valid: bool,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the first entry whose key is `>= key`
    pub fn seek(pager: &'a Pager, root: PageId, key: i64) -> Result<Self> {
        let (_, node) = find_leaf(pager, root, key)?;
        let entry = (0..node.num_keys())
            .find(|&i| node.leaf_key(i) >= key)
            .unwrap_or(node.num_keys());

        let mut cursor = Self {
            pager,
            node,
            entry,
            valid: true,
        };
        cursor.skip_exhausted()?;
        Ok(cursor)
    }

    /// Create a cursor at the leftmost entry of the tree
    pub fn first(pager: &'a Pager, root: PageId) -> Result<Self> {
        let mut node = Node::from_bytes(&pager.read_page(root)?)?;
        while node.is_internal() {
            node = Node::from_bytes(&pager.read_page(node.child(0))?)?;
        }

        let mut cursor = Self {
            pager,
            node,
            entry: 0,
            valid: true,
        };
        cursor.skip_exhausted()?;
        Ok(cursor)
    }

    /// Check if the cursor is positioned at a live entry
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Get the current (key, record offset) pair
    pub fn entry(&self) -> Option<(i64, i64)> {
        if !self.valid {
            return None;
        }
        Some((
            self.node.leaf_key(self.entry),
            self.node.leaf_record_offset(self.entry),
        ))
    }

    /// Move to the next entry, following the leaf chain as needed
    pub fn advance(&mut self) -> Result<bool> {
        if !self.valid {
            return Ok(false);
        }
        self.entry += 1;
        self.skip_exhausted()?;
        Ok(self.valid)
    }

    /// Walk the leaf chain until the entry index lands on a live entry
    fn skip_exhausted(&mut self) -> Result<()> {
        while self.valid && self.entry >= self.node.num_keys() {
            let next = self.node.next_leaf();
            if next.is_some() {
                self.node = Node::from_bytes(&self.pager.read_page(next)?)?;
                self.entry = 0;
            } else {
                self.valid = false;
            }
        }
        Ok(())
    }
}
