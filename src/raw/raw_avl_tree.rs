use core::cmp::Ordering::{Equal, Greater, Less};

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{AvlNode, EMPTY_HEIGHT};
use crate::record::{RoomNumber, RoomRecord};

/// Stack depth that covers any AVL tree the arena can address without spilling.
/// The height of an AVL tree with `n` nodes is below `1.45 * log2(n + 2)`.
const STACK_INLINE: usize = 64;

/// The height-balanced binary search tree backing `RoomIndex`.
///
/// Nodes live in an [`Arena`] and link to their children by [`Handle`]. All structural
/// operations are written recursively over handles: each call returns the handle of the
/// (possibly new) subtree root so the caller can relink it. Recursion depth is bounded by
/// the tree height.
#[derive(Clone, Debug)]
pub(crate) struct RawAvlTree {
    nodes: Arena<AvlNode>,
    root: Option<Handle>,
}

/// Outcome of removing a key from a subtree.
struct Removal {
    /// Root of the subtree after the removal and rebalancing.
    root: Option<Handle>,
    /// The record that left the tree, if the key was present.
    record: Option<RoomRecord>,
}

impl RawAvlTree {
    /// Creates an empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Creates an empty tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    /// Number of nodes, read from the arena in O(1).
    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &AvlNode {
        self.nodes.get(handle)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) fn allocated_bytes(&self) -> usize {
        self.nodes.allocated_bytes()
    }

    /// Height of the whole tree; `-1` when empty.
    pub(crate) fn height(&self) -> i32 {
        self.height_of(self.root)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    /// Binary search by room number.
    pub(crate) fn get(&self, key: RoomNumber) -> Option<&RoomRecord> {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            current = match key.cmp(&node.key()) {
                Less => node.left(),
                Greater => node.right(),
                Equal => return Some(node.record()),
            };
        }
        None
    }

    /// Smallest key present.
    pub(crate) fn first_key(&self) -> Option<RoomNumber> {
        self.root.map(|root| self.nodes.get(self.leftmost(root)).key())
    }

    /// Greatest key present, found by walking the right spine.
    pub(crate) fn last_key(&self) -> Option<RoomNumber> {
        let mut handle = self.root?;
        while let Some(right) = self.nodes.get(handle).right() {
            handle = right;
        }
        Some(self.nodes.get(handle).key())
    }

    /// Ascending traversal of all records.
    pub(crate) fn iter(&self) -> InOrder<'_> {
        InOrder::new(self)
    }

    // ─── Insertion ──────────────────────────────────────────────────────────

    /// Inserts `record` unless its room number is already present.
    ///
    /// Returns `true` if a node was created. A duplicate leaves the tree untouched and
    /// drops `record`.
    pub(crate) fn insert(&mut self, record: RoomRecord) -> bool {
        let (root, inserted) = self.insert_at(self.root, record);
        self.root = Some(root);
        inserted
    }

    fn insert_at(&mut self, subtree: Option<Handle>, record: RoomRecord) -> (Handle, bool) {
        let Some(handle) = subtree else {
            return (self.nodes.alloc(AvlNode::leaf(record)), true);
        };

        let node = self.nodes.get(handle);
        let (key, left, right) = (node.key(), node.left(), node.right());
        match record.room_number().cmp(&key) {
            Equal => (handle, false),
            Less => {
                let (left, inserted) = self.insert_at(left, record);
                self.nodes.get_mut(handle).set_left(Some(left));
                (self.rebalance(handle), inserted)
            }
            Greater => {
                let (right, inserted) = self.insert_at(right, record);
                self.nodes.get_mut(handle).set_right(Some(right));
                (self.rebalance(handle), inserted)
            }
        }
    }

    // ─── Removal ────────────────────────────────────────────────────────────

    /// Removes the node holding `key`, returning its record.
    pub(crate) fn remove(&mut self, key: RoomNumber) -> Option<RoomRecord> {
        let Removal { root, record } = self.remove_at(self.root, key);
        self.root = root;
        record
    }

    fn remove_at(&mut self, subtree: Option<Handle>, key: RoomNumber) -> Removal {
        let Some(handle) = subtree else {
            return Removal { root: None, record: None };
        };

        let node = self.nodes.get(handle);
        let (node_key, left, right) = (node.key(), node.left(), node.right());
        let removal = match key.cmp(&node_key) {
            Less => {
                let removal = self.remove_at(left, key);
                self.nodes.get_mut(handle).set_left(removal.root);
                removal.record
            }
            Greater => {
                let removal = self.remove_at(right, key);
                self.nodes.get_mut(handle).set_right(removal.root);
                removal.record
            }
            Equal => match (left, right) {
                // Zero or one child: splice the node out and hand its slot back.
                (None, child) | (child, None) => {
                    let record = self.nodes.take(handle).into_record();
                    return Removal {
                        root: child,
                        record: Some(record),
                    };
                }
                (Some(_), Some(right)) => {
                    // Promote the in-order successor's record into this node, then remove
                    // the successor (which has no left child) from the right subtree.
                    let successor = self.leftmost(right);
                    let successor_key = self.nodes.get(successor).key();
                    let removal = self.remove_at(Some(right), successor_key);
                    let promoted = removal.record.expect("successor is present in the right subtree");
                    let node = self.nodes.get_mut(handle);
                    node.set_right(removal.root);
                    Some(node.replace_record(promoted))
                }
            },
        };

        Removal {
            root: Some(self.rebalance(handle)),
            record: removal,
        }
    }

    fn leftmost(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self.nodes.get(handle).left() {
            handle = left;
        }
        handle
    }

    // ─── Balancing ──────────────────────────────────────────────────────────

    #[inline]
    fn height_of(&self, subtree: Option<Handle>) -> i32 {
        subtree.map_or(EMPTY_HEIGHT, |handle| self.nodes.get(handle).height())
    }

    fn update_height(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        let height = 1 + self.height_of(node.left()).max(self.height_of(node.right()));
        self.nodes.get_mut(handle).set_height(height);
    }

    /// `height(left) - height(right)`.
    fn balance_factor(&self, handle: Handle) -> i32 {
        let node = self.nodes.get(handle);
        self.height_of(node.left()) - self.height_of(node.right())
    }

    /// Restores the height cache and the balance invariant at `handle`, returning the
    /// root of the rebalanced subtree.
    fn rebalance(&mut self, handle: Handle) -> Handle {
        self.update_height(handle);
        match self.balance_factor(handle) {
            2 => {
                let left = self.nodes.get(handle).left().expect("left-heavy node has a left child");
                if self.balance_factor(left) == -1 {
                    let left = self.rotate_left(left);
                    self.nodes.get_mut(handle).set_left(Some(left));
                }
                self.rotate_right(handle)
            }
            -2 => {
                let right = self.nodes.get(handle).right().expect("right-heavy node has a right child");
                if self.balance_factor(right) == 1 {
                    let right = self.rotate_right(right);
                    self.nodes.get_mut(handle).set_right(Some(right));
                }
                self.rotate_left(handle)
            }
            _ => handle,
        }
    }

    fn rotate_right(&mut self, handle: Handle) -> Handle {
        let pivot = self.nodes.get(handle).left().expect("`rotate_right` needs a left child");
        let inner = self.nodes.get(pivot).right();
        self.nodes.get_mut(handle).set_left(inner);
        self.nodes.get_mut(pivot).set_right(Some(handle));
        // The demoted node is now the pivot's child; its height must be final first.
        self.update_height(handle);
        self.update_height(pivot);
        pivot
    }

    fn rotate_left(&mut self, handle: Handle) -> Handle {
        let pivot = self.nodes.get(handle).right().expect("`rotate_left` needs a right child");
        let inner = self.nodes.get(pivot).left();
        self.nodes.get_mut(handle).set_right(inner);
        self.nodes.get_mut(pivot).set_left(Some(handle));
        self.update_height(handle);
        self.update_height(pivot);
        pivot
    }
}

impl Default for RawAvlTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Ascending in-order iterator over a [`RawAvlTree`].
pub(crate) struct InOrder<'a> {
    tree: &'a RawAvlTree,
    stack: SmallVec<[Handle; STACK_INLINE]>,
}

impl<'a> InOrder<'a> {
    fn new(tree: &'a RawAvlTree) -> Self {
        let mut iter = Self {
            tree,
            stack: SmallVec::new(),
        };
        iter.descend_left(tree.root);
        iter
    }

    fn descend_left(&mut self, mut current: Option<Handle>) {
        while let Some(handle) = current {
            self.stack.push(handle);
            current = self.tree.nodes.get(handle).left();
        }
    }
}

impl<'a> Iterator for InOrder<'a> {
    type Item = &'a RoomRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.stack.pop()?;
        let tree = self.tree;
        let node = tree.nodes.get(handle);
        self.descend_left(node.right());
        Some(node.record())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use crate::record::Group;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    impl RawAvlTree {
        /// Checks the ordering, height-cache and balance invariants of every reachable node
        /// and that the arena holds no unreachable nodes. Panics listing every violation.
        pub(crate) fn validate_invariants(&self) {
            let mut errors: Vec<String> = Vec::new();
            let mut reachable = 0usize;
            if let Some(root) = self.root {
                self.validate_node(root, None, None, &mut reachable, &mut errors);
            }
            if reachable != self.nodes.len() {
                errors.push(format!("arena holds {} nodes but {} are reachable", self.nodes.len(), reachable));
            }
            assert!(errors.is_empty(), "AVL invariant violations:\n{}", errors.join("\n"));
        }

        // Returns the subtree height.
        fn validate_node(
            &self,
            handle: Handle,
            lower: Option<RoomNumber>,
            upper: Option<RoomNumber>,
            reachable: &mut usize,
            errors: &mut Vec<String>,
        ) -> i32 {
            *reachable += 1;
            let node = self.nodes.get(handle);
            let key = node.key();

            if lower.is_some_and(|lower| key <= lower) || upper.is_some_and(|upper| key >= upper) {
                errors.push(format!("key {key} outside ({lower:?}, {upper:?})"));
            }

            let left = node
                .left()
                .map_or(EMPTY_HEIGHT, |left| self.validate_node(left, lower, Some(key), reachable, errors));
            let right = node
                .right()
                .map_or(EMPTY_HEIGHT, |right| self.validate_node(right, Some(key), upper, reachable, errors));

            let height = 1 + left.max(right);
            if node.height() != height {
                errors.push(format!("key {key}: cached height {} but computed {height}", node.height()));
            }
            if (left - right).abs() > 1 {
                errors.push(format!("key {key}: left height {left}, right height {right}"));
            }
            if node.is_leaf() && node.height() != 0 {
                errors.push(format!("leaf {key} has height {}", node.height()));
            }
            height
        }

        fn keys(&self) -> Vec<RoomNumber> {
            self.iter().map(RoomRecord::room_number).collect()
        }
    }

    fn record(key: RoomNumber) -> RoomRecord {
        RoomRecord::new(key, Group::nested(&[1, 1, 1, key.unsigned_abs() as u32 % 7 + 1]))
    }

    fn tree_of(keys: &[RoomNumber]) -> RawAvlTree {
        let mut tree = RawAvlTree::new();
        for &key in keys {
            tree.insert(record(key));
        }
        tree
    }

    #[test]
    fn empty_tree() {
        let tree = RawAvlTree::new();
        tree.validate_invariants();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), -1);
        assert_eq!(tree.last_key(), None);
        assert!(tree.get(0).is_none());
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn single_rotations() {
        // Ascending input needs left rotations, descending needs right rotations.
        let ascending = tree_of(&[1, 2, 3]);
        ascending.validate_invariants();
        assert_eq!(ascending.node(ascending.root().unwrap()).key(), 2);

        let descending = tree_of(&[3, 2, 1]);
        descending.validate_invariants();
        assert_eq!(descending.node(descending.root().unwrap()).key(), 2);
        assert_eq!(descending.height(), 1);
    }

    #[test]
    fn double_rotations() {
        let left_right = tree_of(&[30, 10, 20]);
        left_right.validate_invariants();
        assert_eq!(left_right.node(left_right.root().unwrap()).key(), 20);

        let right_left = tree_of(&[10, 30, 20]);
        right_left.validate_invariants();
        assert_eq!(right_left.node(right_left.root().unwrap()).key(), 20);
    }

    #[test]
    fn duplicate_insert_keeps_original_record() {
        let mut tree = tree_of(&[5, 1, 9]);
        assert!(!tree.insert(RoomRecord::new(5, Group::PreExisting)));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(5), Some(&record(5)));
        tree.validate_invariants();
    }

    #[test]
    fn ascending_insert_height_bound() {
        let keys: Vec<RoomNumber> = (1..=100).collect();
        let tree = tree_of(&keys);
        tree.validate_invariants();
        assert!(tree.height() <= 10, "height {} exceeds the AVL bound", tree.height());
        assert!(f64::from(tree.height()) <= 1.45 * (101f64).log2());
    }

    #[test]
    fn remove_node_with_two_children_promotes_successor() {
        let mut tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(tree.node(tree.root().unwrap()).key(), 4);

        assert_eq!(tree.remove(4), Some(record(4)));
        tree.validate_invariants();
        assert_eq!(tree.keys(), vec![1, 2, 3, 5, 6, 7]);
        // The successor's whole record moved up, not just its key.
        assert_eq!(tree.node(tree.root().unwrap()).record(), &record(5));
        assert_eq!(tree.get(5), Some(&record(5)));
    }

    #[test]
    fn remove_leaf_and_single_child() {
        let mut tree = tree_of(&[20, 10, 30, 25]);
        assert_eq!(tree.remove(25).map(|r| r.room_number()), Some(25));
        tree.validate_invariants();
        assert_eq!(tree.remove(30).map(|r| r.room_number()), Some(30));
        tree.validate_invariants();
        assert_eq!(tree.keys(), vec![10, 20]);
        assert_eq!(tree.remove(99), None);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn removal_rebalances_up_the_path() {
        let mut tree = tree_of(&(0..64).collect::<Vec<_>>());
        for key in 0..48 {
            assert!(tree.remove(key).is_some());
            tree.validate_invariants();
        }
        assert_eq!(tree.keys(), (48..64).collect::<Vec<_>>());
        assert!(tree.height() <= 4);
    }

    #[test]
    fn last_key_follows_right_spine() {
        let mut tree = tree_of(&[10, 20, 5, 6, 15]);
        assert_eq!(tree.last_key(), Some(20));
        tree.remove(20);
        assert_eq!(tree.last_key(), Some(15));
    }

    #[test]
    fn clear_releases_every_node() {
        let mut tree = tree_of(&[3, 1, 2]);
        tree.clear();
        tree.validate_invariants();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i64),
        Remove(i64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (-200i64..800).prop_map(Op::Insert),
            2 => (-200i64..800).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn invariants_hold_after_every_operation(ops in prop::collection::vec(op_strategy(), 0..400)) {
            let mut tree = RawAvlTree::new();
            let mut model: BTreeMap<i64, RoomRecord> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        let inserted = tree.insert(record(key));
                        let expected = !model.contains_key(&key);
                        if expected {
                            model.insert(key, record(key));
                        }
                        prop_assert_eq!(inserted, expected, "insert({})", key);
                    }
                    Op::Remove(key) => {
                        prop_assert_eq!(tree.remove(key), model.remove(&key), "remove({})", key);
                    }
                }
                tree.validate_invariants();
            }

            prop_assert_eq!(tree.len(), model.len());
            prop_assert_eq!(tree.keys(), model.keys().copied().collect::<Vec<_>>());
            prop_assert_eq!(tree.last_key(), model.keys().next_back().copied());
            if !model.is_empty() {
                let bound = 1.45 * ((model.len() + 2) as f64).log2();
                prop_assert!(f64::from(tree.height()) < bound);
            }
        }

        #[test]
        fn lookup_matches_model(keys in prop::collection::btree_set(-1000i64..1000, 0..200), target in -1000i64..1000) {
            let tree = tree_of(&keys.iter().copied().collect::<Vec<_>>());
            prop_assert_eq!(tree.get(target).is_some(), keys.contains(&target));
        }
    }
}
