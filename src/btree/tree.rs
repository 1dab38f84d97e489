//! B+ tree core implementation.
//!
//! This module provides the main BPlusTree struct with operations for:
//! - search: point lookups by key
//! - search_range: ordered range scans over the leaf chain
//! - insert: insertion with leaf and internal splits up to root promotion
//! - check: full-tree integrity verification
//!
//! Every node occupies exactly one page and refers to its neighbors by
//! page id, never by memory reference: parents, children and leaf
//! siblings are all resolved by loading their page through the pager.
//! Descent is iterative; the parent-side insertion after a split recurses
//! upward, bounded by the tree height.

use crate::btree::Cursor;
use crate::error::{IndexError, Result};
use crate::page::Node;
use crate::storage::Pager;
use crate::types::{validate_degree, PageId};
use log::debug;
use std::sync::Arc;

/// Descend from `root` to the leaf whose key range covers `key`
pub(crate) fn find_leaf(pager: &Pager, root: PageId, key: i64) -> Result<(PageId, Node)> {
    let mut page_id = root;
    let mut node = Node::from_bytes(&pager.read_page(page_id)?)?;
    while node.is_internal() {
        page_id = node.child(node.find_child(key));
        node = Node::from_bytes(&pager.read_page(page_id)?)?;
    }
    Ok((page_id, node))
}

/// A disk-resident B+ tree mapping i64 keys to i64 record offsets
pub struct BPlusTree {
    /// Pager for all page access
    pager: Arc<Pager>,
    /// Page currently holding the root node
    root_page: PageId,
    /// Branching factor; a node holds at most `degree - 1` keys
    degree: usize,
}

/// Counts gathered by a successful integrity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of pages on the path from the root to any leaf
    pub depth: usize,
    /// Number of leaf pages
    pub leaf_pages: usize,
    /// Number of internal pages
    pub internal_pages: usize,
    /// Total number of keys across all leaves
    pub keys: usize,
}

impl BPlusTree {
    /// Open the tree stored in `pager`, creating the empty root if the
    /// file holds no tree yet
    pub fn open(pager: Arc<Pager>) -> Result<Self> {
        let degree = pager.degree();
        validate_degree(degree)?;

        let mut root_page = pager.root_page();
        if !root_page.is_some() {
            // Fresh file: the tree starts as a single empty root leaf.
            root_page = pager.allocate_page()?;
            let mut root = Node::new_leaf();
            root.set_is_root(true);
            pager.write_page(root_page, root.as_bytes())?;
            pager.set_root_page(root_page)?;
            debug!("initialized empty root leaf at page {}", root_page);
        }

        Ok(Self {
            pager,
            root_page,
            degree,
        })
    }

    /// Get the branching factor
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Get the page currently holding the root
    pub fn root_page(&self) -> PageId {
        self.root_page
    }

    /// Look up a key and return its record offset
    pub fn search(&self, key: i64) -> Result<Option<i64>> {
        let (_, leaf) = find_leaf(&self.pager, self.root_page, key)?;
        Ok(leaf.leaf_search(key).map(|i| leaf.leaf_record_offset(i)))
    }

    /// Collect the record offsets of all keys in `[start, end]`, in
    /// ascending key order
    ///
    /// An inverted range (`start > end`) yields an empty result.
    pub fn search_range(&self, start: i64, end: i64) -> Result<Vec<i64>> {
        if start > end {
            return Ok(Vec::new());
        }

        let mut offsets = Vec::new();
        let mut cursor = self.cursor_at(start)?;
        while let Some((key, record_offset)) = cursor.entry() {
            if key > end {
                break;
            }
            offsets.push(record_offset);
            cursor.advance()?;
        }
        Ok(offsets)
    }

    /// Create a cursor at the leftmost entry
    pub fn cursor(&self) -> Result<Cursor<'_>> {
        Cursor::first(&self.pager, self.root_page)
    }

    /// Create a cursor at the first entry whose key is `>= key`
    pub fn cursor_at(&self, key: i64) -> Result<Cursor<'_>> {
        Cursor::seek(&self.pager, self.root_page, key)
    }

    /// Insert a key/record-offset pair
    ///
    /// Fails with [`IndexError::DuplicateKey`] if the key is already
    /// present, leaving the file untouched.
    pub fn insert(&mut self, key: i64, record_offset: i64) -> Result<()> {
        let (leaf_id, mut leaf) = find_leaf(&self.pager, self.root_page, key)?;

        if leaf.leaf_search(key).is_some() {
            return Err(IndexError::DuplicateKey { key });
        }

        if leaf.num_keys() < self.degree - 1 {
            let pos = leaf.leaf_insert_position(key);
            leaf.insert_leaf_entry(pos, key, record_offset);
            return self.pager.write_page(leaf_id, leaf.as_bytes());
        }

        self.split_leaf(leaf_id, leaf, key, record_offset)
    }

    /// Split a full leaf around a new entry and promote a separator
    fn split_leaf(
        &mut self,
        leaf_id: PageId,
        leaf: Node,
        key: i64,
        record_offset: i64,
    ) -> Result<()> {
        // Materialize the D-entry sorted sequence, then cut it in two.
        let mut entries = leaf.leaf_entries();
        let pos = entries
            .iter()
            .position(|&(k, _)| k > key)
            .unwrap_or(entries.len());
        entries.insert(pos, (key, record_offset));

        let split = self.degree / 2;
        let right_entries = entries.split_off(split);
        // The right sibling's first key is copied up as the separator.
        let separator = right_entries[0].0;

        let old_next = leaf.next_leaf();
        let parent = leaf.parent();

        let new_id = self.pager.allocate_page()?;
        let mut right = Node::new_leaf();
        right.set_parent(parent);
        right.set_next_leaf(old_next);
        right.write_leaf_entries(&right_entries);

        let mut left = leaf;
        left.write_leaf_entries(&entries);
        left.set_next_leaf(new_id);

        self.pager.write_page(new_id, right.as_bytes())?;
        self.pager.write_page(leaf_id, left.as_bytes())?;

        debug!(
            "split leaf {} at key {}, new right leaf {}",
            leaf_id, separator, new_id
        );

        self.insert_into_parent(parent, leaf_id, separator, new_id)
    }

    /// Consume a promotion event at the parent level
    ///
    /// `left_id` and `right_id` are siblings produced by a split one
    /// level below; `key` is the separator between them.
    fn insert_into_parent(
        &mut self,
        parent_id: PageId,
        left_id: PageId,
        key: i64,
        right_id: PageId,
    ) -> Result<()> {
        if !parent_id.is_some() {
            return self.grow_new_root(left_id, key, right_id);
        }

        let mut parent = Node::from_bytes(&self.pager.read_page(parent_id)?)?;

        if parent.num_keys() < self.degree - 1 {
            let pos = parent.separator_insert_position(key);
            parent.insert_separator(pos, key, right_id);
            return self.pager.write_page(parent_id, parent.as_bytes());
        }

        self.split_internal(parent_id, parent, key, right_id)
    }

    /// The split reached the current root: create a new root above it
    fn grow_new_root(&mut self, left_id: PageId, key: i64, right_id: PageId) -> Result<()> {
        let new_root_id = self.pager.allocate_page()?;

        // Rewire the children before the page that references them.
        for &child_id in &[left_id, right_id] {
            let mut child = Node::from_bytes(&self.pager.read_page(child_id)?)?;
            child.set_is_root(false);
            child.set_parent(new_root_id);
            self.pager.write_page(child_id, child.as_bytes())?;
        }

        let mut root = Node::new_internal();
        root.set_is_root(true);
        root.write_internal(&[key], &[left_id, right_id]);
        self.pager.write_page(new_root_id, root.as_bytes())?;

        // Persist the migration, then adopt it in memory.
        self.pager.set_root_page(new_root_id)?;
        self.root_page = new_root_id;

        debug!(
            "root split: new root {} separates {} | {} at key {}",
            new_root_id, left_id, right_id, key
        );
        Ok(())
    }

    /// Split a full internal node around a new separator and recurse
    fn split_internal(
        &mut self,
        page_id: PageId,
        node: Node,
        key: i64,
        right_child_id: PageId,
    ) -> Result<()> {
        // Materialize D keys and D + 1 pointers, then redistribute.
        let mut keys = node.separators();
        let mut children = node.children();
        let pos = keys.iter().position(|&k| k > key).unwrap_or(keys.len());
        keys.insert(pos, key);
        children.insert(pos + 1, right_child_id);

        let split = self.degree / 2;
        // The middle key moves up; it appears in neither half.
        let promoted = keys[split];

        let right_keys = keys.split_off(split + 1);
        keys.truncate(split);
        let right_children = children.split_off(split + 1);

        let parent = node.parent();

        let new_id = self.pager.allocate_page()?;
        let mut right = Node::new_internal();
        right.set_parent(parent);
        right.write_internal(&right_keys, &right_children);

        let mut left = node;
        left.write_internal(&keys, &children);

        self.pager.write_page(new_id, right.as_bytes())?;
        self.pager.write_page(page_id, left.as_bytes())?;

        // Children handed to the right sibling must point at it on disk.
        for &child_id in &right_children {
            let mut child = Node::from_bytes(&self.pager.read_page(child_id)?)?;
            child.set_parent(new_id);
            self.pager.write_page(child_id, child.as_bytes())?;
        }

        debug!(
            "split internal {} at key {}, new right node {}",
            page_id, promoted, new_id
        );

        self.insert_into_parent(parent, page_id, promoted, new_id)
    }

    /// Number of pages on the path from the root to a leaf
    pub fn height(&self) -> Result<usize> {
        let mut depth = 1;
        let mut node = Node::from_bytes(&self.pager.read_page(self.root_page)?)?;
        while node.is_internal() {
            node = Node::from_bytes(&self.pager.read_page(node.child(0))?)?;
            depth += 1;
        }
        Ok(depth)
    }

    /// Verify the structural invariants of the whole tree
    ///
    /// Walks every reachable page and checks node ordering, separator
    /// ranges, uniform leaf depth, parent backpointers, the root flag,
    /// key-count bounds, and that the leaf chain visits every leaf
    /// exactly once in key order before terminating. Any violation
    /// surfaces as [`IndexError::Corruption`].
    pub fn check(&self) -> Result<TreeStats> {
        let mut stats = TreeStats {
            depth: 0,
            leaf_pages: 0,
            internal_pages: 0,
            keys: 0,
        };
        let mut leaves = Vec::new();

        self.check_node(
            self.root_page,
            1,
            None,
            None,
            PageId::NONE,
            &mut stats,
            &mut leaves,
        )?;
        self.check_leaf_chain(&leaves)?;

        Ok(stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn check_node(
        &self,
        page_id: PageId,
        depth: usize,
        low: Option<i64>,
        high: Option<i64>,
        expected_parent: PageId,
        stats: &mut TreeStats,
        leaves: &mut Vec<PageId>,
    ) -> Result<()> {
        let node = Node::from_bytes(&self.pager.read_page(page_id)?)?;

        let is_root = page_id == self.root_page;
        if node.is_root() != is_root {
            return Err(IndexError::corruption(format!(
                "page {} root flag is {}, expected {}",
                page_id,
                node.is_root(),
                is_root
            )));
        }
        if node.parent() != expected_parent {
            return Err(IndexError::corruption(format!(
                "page {} has parent {}, expected {}",
                page_id,
                node.parent(),
                expected_parent
            )));
        }
        if node.num_keys() > self.degree - 1 {
            return Err(IndexError::corruption(format!(
                "page {} holds {} keys, more than degree - 1 = {}",
                page_id,
                node.num_keys(),
                self.degree - 1
            )));
        }
        if node.num_keys() == 0 && !(is_root && node.is_leaf()) {
            // Only the root of an empty tree may have no keys.
            return Err(IndexError::corruption(format!("page {} is empty", page_id)));
        }

        let keys: Vec<i64> = if node.is_leaf() {
            (0..node.num_keys()).map(|i| node.leaf_key(i)).collect()
        } else {
            node.separators()
        };

        if keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IndexError::corruption(format!(
                "page {} keys are not strictly increasing",
                page_id
            )));
        }
        if let (Some(low), Some(&first)) = (low, keys.first()) {
            if first < low {
                return Err(IndexError::corruption(format!(
                    "page {} holds key {} below its lower bound {}",
                    page_id, first, low
                )));
            }
        }
        if let (Some(high), Some(&last)) = (high, keys.last()) {
            if last >= high {
                return Err(IndexError::corruption(format!(
                    "page {} holds key {} at or above its upper bound {}",
                    page_id, last, high
                )));
            }
        }

        if node.is_leaf() {
            stats.leaf_pages += 1;
            stats.keys += node.num_keys();
            if stats.depth == 0 {
                stats.depth = depth;
            } else if stats.depth != depth {
                return Err(IndexError::corruption(format!(
                    "leaf {} sits at depth {}, others at depth {}",
                    page_id, depth, stats.depth
                )));
            }
            leaves.push(page_id);
            return Ok(());
        }

        stats.internal_pages += 1;
        for (i, &child) in node.children().iter().enumerate() {
            if !child.is_some() || child == PageId::META || child.value() >= self.pager.num_pages()
            {
                return Err(IndexError::corruption(format!(
                    "page {} child {} points at invalid page {}",
                    page_id, i, child
                )));
            }
            // Child i covers [K(i-1), K(i)) with open outer bounds.
            let child_low = if i == 0 { low } else { Some(keys[i - 1]) };
            let child_high = keys.get(i).copied().or(high);
            self.check_node(child, depth + 1, child_low, child_high, page_id, stats, leaves)?;
        }
        Ok(())
    }

    /// Check that the next-leaf chain visits exactly the leaves the tree
    /// walk found, in the same order, and terminates
    fn check_leaf_chain(&self, leaves: &[PageId]) -> Result<()> {
        let first = leaves
            .first()
            .copied()
            .ok_or_else(|| IndexError::corruption("tree has no leaves"))?;

        let mut chain = Vec::with_capacity(leaves.len());
        let mut page_id = first;
        loop {
            chain.push(page_id);
            if chain.len() > leaves.len() {
                return Err(IndexError::corruption(
                    "leaf chain visits more pages than the tree holds",
                ));
            }

            let node = Node::from_bytes(&self.pager.read_page(page_id)?)?;
            if !node.is_leaf() {
                return Err(IndexError::corruption(format!(
                    "leaf chain reached non-leaf page {}",
                    page_id
                )));
            }

            let next = node.next_leaf();
            if !next.is_some() {
                break;
            }
            page_id = next;
        }

        if chain != leaves {
            return Err(IndexError::corruption(
                "leaf chain does not match the tree's leaf order",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PageId, PAGE_SIZE};
    use std::path::Path;
    use tempfile::tempdir;

    fn open_tree(path: &Path, degree: usize) -> Result<BPlusTree> {
        let pager = Arc::new(Pager::open(path, degree, false)?);
        BPlusTree::open(pager)
    }

    fn create_test_tree(degree: usize) -> Result<(BPlusTree, tempfile::TempDir)> {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempdir().unwrap();
        let tree = open_tree(&dir.path().join("test.idx"), degree)?;
        Ok((tree, dir))
    }

    fn read_node(tree: &BPlusTree, page_id: i64) -> Node {
        Node::from_bytes(&tree.pager.read_page(PageId::new(page_id)).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_tree() -> Result<()> {
        let (tree, _dir) = create_test_tree(4)?;

        assert_eq!(tree.root_page(), PageId::new(1));
        assert_eq!(tree.search(42)?, None);
        assert_eq!(tree.search_range(0, 100)?, Vec::<i64>::new());

        let stats = tree.check()?;
        assert_eq!(stats.depth, 1);
        assert_eq!(stats.leaf_pages, 1);
        assert_eq!(stats.keys, 0);

        Ok(())
    }

    #[test]
    fn test_single_leaf_inserts() -> Result<()> {
        let (mut tree, _dir) = create_test_tree(4)?;

        tree.insert(10, 100)?;
        tree.insert(20, 200)?;
        tree.insert(30, 300)?;

        assert_eq!(tree.search(20)?, Some(200));
        assert_eq!(tree.search(25)?, None);

        // Still a single root leaf holding the sorted entries.
        assert_eq!(tree.root_page(), PageId::new(1));
        let root = read_node(&tree, 1);
        assert!(root.is_leaf());
        assert!(root.is_root());
        assert_eq!(root.parent(), PageId::NONE);
        assert_eq!(root.next_leaf(), PageId::NONE);
        assert_eq!(root.leaf_entries(), vec![(10, 100), (20, 200), (30, 300)]);

        Ok(())
    }

    #[test]
    fn test_first_leaf_split() -> Result<()> {
        let (mut tree, _dir) = create_test_tree(4)?;

        for key in [10, 20, 30] {
            tree.insert(key, key * 10)?;
        }
        tree.insert(40, 400)?;

        // The old leaf keeps [10, 20]; the new leaf 2 takes [30, 40];
        // a fresh internal root at page 3 separates them at key 30.
        assert_eq!(tree.root_page(), PageId::new(3));

        let left = read_node(&tree, 1);
        assert!(left.is_leaf() && !left.is_root());
        assert_eq!(left.leaf_entries(), vec![(10, 100), (20, 200)]);
        assert_eq!(left.next_leaf(), PageId::new(2));
        assert_eq!(left.parent(), PageId::new(3));

        let right = read_node(&tree, 2);
        assert!(right.is_leaf() && !right.is_root());
        assert_eq!(right.leaf_entries(), vec![(30, 300), (40, 400)]);
        assert_eq!(right.next_leaf(), PageId::NONE);
        assert_eq!(right.parent(), PageId::new(3));

        let root = read_node(&tree, 3);
        assert!(root.is_internal() && root.is_root());
        assert_eq!(root.parent(), PageId::NONE);
        assert_eq!(root.separators(), vec![30]);
        assert_eq!(root.children(), vec![PageId::new(1), PageId::new(2)]);

        assert_eq!(tree.search(40)?, Some(400));
        assert_eq!(tree.search_range(15, 35)?, vec![200, 300]);
        tree.check()?;

        Ok(())
    }

    #[test]
    fn test_three_leaves() -> Result<()> {
        let (mut tree, _dir) = create_test_tree(4)?;

        for key in 1..=7 {
            tree.insert(key, key * 10)?;
        }

        let stats = tree.check()?;
        assert_eq!(stats.depth, 2);
        assert_eq!(stats.leaf_pages, 3);
        assert_eq!(stats.internal_pages, 1);
        assert_eq!(stats.keys, 7);

        let root = read_node(&tree, tree.root_page().value());
        assert_eq!(root.num_keys(), 2);

        assert_eq!(tree.search_range(2, 6)?, vec![20, 30, 40, 50, 60]);

        Ok(())
    }

    #[test]
    fn test_internal_split_grows_height() -> Result<()> {
        let (mut tree, _dir) = create_test_tree(4)?;

        for key in 1..=10 {
            tree.insert(key, key * 10)?;
        }

        assert_eq!(tree.height()?, 3);
        assert_eq!(tree.search(7)?, Some(70));

        let stats = tree.check()?;
        assert_eq!(stats.depth, 3);
        assert_eq!(stats.keys, 10);

        let root = read_node(&tree, tree.root_page().value());
        assert!(root.is_internal() && root.is_root());
        for &child_id in &root.children() {
            let child = read_node(&tree, child_id.value());
            assert!(child.is_internal());
            assert_eq!(child.parent(), tree.root_page());
        }

        Ok(())
    }

    #[test]
    fn test_split_right_leaf_inherits_chain_link() -> Result<()> {
        let (mut tree, _dir) = create_test_tree(4)?;

        for key in [10, 20, 30, 40] {
            tree.insert(key, key)?;
        }
        // Leaf 1 now holds [10, 20] and links to leaf 2. Overflowing it
        // must hand the link on to the new right sibling.
        tree.insert(11, 11)?;
        tree.insert(12, 12)?;

        let left = read_node(&tree, 1);
        assert_eq!(left.leaf_entries(), vec![(10, 10), (11, 11)]);
        let new_right_id = left.next_leaf();
        assert_ne!(new_right_id, PageId::new(2));

        let new_right = read_node(&tree, new_right_id.value());
        assert_eq!(new_right.leaf_entries(), vec![(12, 12), (20, 20)]);
        assert_eq!(new_right.next_leaf(), PageId::new(2));

        tree.check()?;
        Ok(())
    }

    #[test]
    fn test_duplicate_key_leaves_file_untouched() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let mut tree = open_tree(&path, 4)?;
        tree.insert(5, 500)?;

        let before = std::fs::read(&path).unwrap();
        let err = tree.insert(5, 999).unwrap_err();
        assert!(matches!(err, IndexError::DuplicateKey { key: 5 }));
        let after = std::fs::read(&path).unwrap();

        assert_eq!(before, after);
        assert_eq!(tree.search(5)?, Some(500));

        Ok(())
    }

    #[test]
    fn test_duplicate_key_in_deep_tree() -> Result<()> {
        let (mut tree, _dir) = create_test_tree(4)?;

        for key in 0..100 {
            tree.insert(key, key)?;
        }
        assert!(matches!(
            tree.insert(37, 0),
            Err(IndexError::DuplicateKey { key: 37 })
        ));
        assert_eq!(tree.search(37)?, Some(37));

        Ok(())
    }

    #[test]
    fn test_inverted_range_is_empty() -> Result<()> {
        let (mut tree, _dir) = create_test_tree(4)?;

        for key in 1..=20 {
            tree.insert(key, key)?;
        }
        assert_eq!(tree.search_range(15, 5)?, Vec::<i64>::new());

        Ok(())
    }

    #[test]
    fn test_range_bounds_are_inclusive() -> Result<()> {
        let (mut tree, _dir) = create_test_tree(4)?;

        for key in (0..50).map(|k| k * 2) {
            tree.insert(key, key + 1)?;
        }

        // Bounds that hit keys exactly and bounds that fall between keys.
        assert_eq!(tree.search_range(10, 14)?, vec![11, 13, 15]);
        assert_eq!(tree.search_range(9, 15)?, vec![11, 13, 15]);
        assert_eq!(tree.search_range(98, 200)?, vec![99]);
        assert_eq!(tree.search_range(200, 300)?, Vec::<i64>::new());

        Ok(())
    }

    #[test]
    fn test_cursor_full_scan() -> Result<()> {
        let (mut tree, _dir) = create_test_tree(4)?;

        for key in 1..=25 {
            tree.insert(key, key * 2)?;
        }

        let mut seen = Vec::new();
        let mut cursor = tree.cursor()?;
        while let Some((key, record_offset)) = cursor.entry() {
            seen.push((key, record_offset));
            cursor.advance()?;
        }

        let expected: Vec<(i64, i64)> = (1..=25).map(|k| (k, k * 2)).collect();
        assert_eq!(seen, expected);
        assert!(!cursor.is_valid());

        Ok(())
    }

    #[test]
    fn test_thousand_ascending_inserts() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let mut tree = open_tree(&path, 4)?;
        for key in 0..1000 {
            tree.insert(key, key * 10)?;
        }

        let expected: Vec<i64> = (250..=300).map(|k| k * 10).collect();
        assert_eq!(tree.search_range(250, 300)?, expected);

        let stats = tree.check()?;
        assert_eq!(stats.keys, 1000);

        // Reopen and verify the structure and contents survived.
        drop(tree);
        let tree = open_tree(&path, 4)?;
        assert_eq!(tree.check()?, stats);
        assert_eq!(tree.search_range(250, 300)?, expected);
        for key in [0, 1, 499, 999] {
            assert_eq!(tree.search(key)?, Some(key * 10));
        }
        assert_eq!(tree.search(1000)?, None);

        Ok(())
    }

    #[test]
    fn test_reopen_after_root_split_finds_migrated_root() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let root_before;
        {
            let mut tree = open_tree(&path, 4)?;
            for key in 1..=10 {
                tree.insert(key, key * 10)?;
            }
            root_before = tree.root_page();
            assert_ne!(root_before, PageId::new(1));
        }

        // The configured degree is ignored in favor of the stored one,
        // and descent starts from the persisted root.
        let tree = open_tree(&path, 100)?;
        assert_eq!(tree.degree(), 4);
        assert_eq!(tree.root_page(), root_before);
        assert_eq!(tree.search(7)?, Some(70));
        tree.check()?;

        Ok(())
    }

    #[test]
    fn test_random_insertion_order() -> Result<()> {
        use rand::seq::SliceRandom;

        let (mut tree, _dir) = create_test_tree(5)?;

        let mut keys: Vec<i64> = (0..500).collect();
        keys.shuffle(&mut rand::thread_rng());
        for &key in &keys {
            tree.insert(key, key * 3)?;
        }

        let stats = tree.check()?;
        assert_eq!(stats.keys, 500);

        for &key in &keys {
            assert_eq!(tree.search(key)?, Some(key * 3));
        }

        // A range scan over everything equals the sorted key sequence.
        let all: Vec<i64> = (0..500).map(|k| k * 3).collect();
        assert_eq!(tree.search_range(i64::MIN, i64::MAX)?, all);
        assert_eq!(tree.search_range(123, 321)?, all[123..=321].to_vec());

        Ok(())
    }

    #[test]
    fn test_negative_keys() -> Result<()> {
        let (mut tree, _dir) = create_test_tree(4)?;

        for key in -20..=20 {
            tree.insert(key, key)?;
        }

        assert_eq!(tree.search(-20)?, Some(-20));
        assert_eq!(tree.search(-21)?, None);
        let expected: Vec<i64> = (-5..=5).collect();
        assert_eq!(tree.search_range(-5, 5)?, expected);
        tree.check()?;

        Ok(())
    }

    #[test]
    fn test_minimum_degree() -> Result<()> {
        let (mut tree, _dir) = create_test_tree(3)?;

        for key in 0..50 {
            tree.insert(key, key)?;
        }
        let stats = tree.check()?;
        assert_eq!(stats.keys, 50);
        assert_eq!(tree.search_range(10, 20)?, (10..=20).collect::<Vec<i64>>());

        Ok(())
    }

    #[test]
    fn test_degree_bounds_rejected() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempdir().unwrap();

        assert!(matches!(
            open_tree(&dir.path().join("small.idx"), 2),
            Err(IndexError::DegreeTooSmall { degree: 2 })
        ));
        assert!(matches!(
            open_tree(&dir.path().join("large.idx"), 1000),
            Err(IndexError::DegreeTooLarge { .. })
        ));
    }

    #[test]
    fn test_file_grows_in_whole_pages() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let mut tree = open_tree(&path, 4)?;
        for key in 0..100 {
            tree.insert(key, key)?;
        }

        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len % PAGE_SIZE as u64, 0);
        assert_eq!(len / PAGE_SIZE as u64, tree.pager.num_pages() as u64);

        Ok(())
    }
}
