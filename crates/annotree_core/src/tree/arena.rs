//! Arena storage and linkage operations for `Tree<T>`.

use super::cursor::{Ancestors, DepthFirst, Leaves, ReverseDepthFirst, ReverseLeaves};
use super::{TreeError, TreeResult};
use std::fmt::{Display, Formatter};

/// Stable handle of one node inside a `Tree`.
///
/// Handles are slot indices; a removed node's slot stays empty, so a handle
/// never starts addressing a different node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw slot index, mainly useful for diagnostics.
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Node<T> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: T,
}

/// Ordered tree (or forest) of payloads of type `T`.
///
/// Queries on a handle that does not address a live node behave like queries
/// on a detached leaf: no parent, no children, row 0.
#[derive(Debug)]
pub struct Tree<T> {
    slots: Vec<Option<Node<T>>>,
    live: usize,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns whether `id` addresses a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Creates one node carrying `data`.
    ///
    /// With a parent, the node is inserted into the parent's children at
    /// `sibling_index`, or appended when the index is `None`. Without a
    /// parent the node becomes a new root.
    ///
    /// # Errors
    /// - `NodeNotFound` when `parent` is not live.
    /// - `IndexOutOfRange` when `sibling_index` exceeds the child count.
    pub fn insert(
        &mut self,
        data: T,
        parent: Option<NodeId>,
        sibling_index: Option<usize>,
    ) -> TreeResult<NodeId> {
        if let Some(parent) = parent {
            let len = self.require(parent)?.children.len();
            if let Some(index) = sibling_index {
                if index > len {
                    return Err(TreeError::IndexOutOfRange { index, len });
                }
            }
        }

        let id = NodeId(self.slots.len());
        self.slots.push(Some(Node {
            parent,
            children: Vec::new(),
            data,
        }));
        self.live += 1;

        if let Some(parent) = parent.and_then(|parent| self.node_mut(parent)) {
            match sibling_index {
                Some(index) => parent.children.insert(index, id),
                None => parent.children.push(id),
            }
        }
        Ok(id)
    }

    /// Creates a parentless node.
    pub fn insert_root(&mut self, data: T) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Node {
            parent: None,
            children: Vec::new(),
            data,
        }));
        self.live += 1;
        id
    }

    /// Creates a node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, data: T) -> TreeResult<NodeId> {
        self.insert(data, Some(parent), None)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(|node| &node.data)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_mut(id).map(|node| &mut node.data)
    }

    /// Live parentless nodes in creation order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Some(node) if node.parent.is_none() => Some(NodeId(index)),
                _ => None,
            })
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Index among siblings, 0 for roots.
    pub fn row(&self, id: NodeId) -> usize {
        self.parent(id)
            .and_then(|parent| self.children(parent).iter().position(|child| *child == id))
            .unwrap_or(0)
    }

    /// Number of ancestors between `id` and its tree root.
    pub fn level(&self, id: NodeId) -> usize {
        self.parents(id).count()
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.parent(id).is_none()
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        self.children(parent).get(self.row(id) + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let row = self.row(id).checked_sub(1)?;
        self.children(parent).get(row).copied()
    }

    /// Returns whether `ancestor` is reached by walking parent links up from `id`.
    ///
    /// A node is never its own ancestor.
    pub fn has_ancestor(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.parents(id).any(|current| current == ancestor)
    }

    /// Ancestors from the immediate parent up to the root.
    pub fn parents(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors::new(self, id)
    }

    /// Pre-order traversal of the subtree rooted at `id`, `id` included.
    pub fn subtree_depth_first(&self, id: NodeId) -> DepthFirst<'_, T> {
        DepthFirst::new(self, id)
    }

    /// Exact reverse of `subtree_depth_first`.
    pub fn subtree_reverse_depth_first(&self, id: NodeId) -> ReverseDepthFirst<'_, T> {
        ReverseDepthFirst::new(self, id)
    }

    /// Leaves of the subtree rooted at `id` in depth-first order.
    pub fn subtree_leaves(&self, id: NodeId) -> Leaves<'_, T> {
        Leaves::new(self, id)
    }

    /// Leaves of the subtree rooted at `id` in reverse depth-first order.
    pub fn subtree_reverse_leaves(&self, id: NodeId) -> ReverseLeaves<'_, T> {
        ReverseLeaves::new(self, id)
    }

    /// Detaches `id` from its parent; the node and its subtree stay alive as a
    /// new root.
    pub fn orphan(&mut self, id: NodeId) -> TreeResult<()> {
        let parent = self.require(id)?.parent;
        if let Some(parent) = parent.and_then(|parent| self.node_mut(parent)) {
            parent.children.retain(|child| *child != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
        Ok(())
    }

    /// Moves `child` (with its subtree) to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let index = self.detached_child_count(parent, child)?;
        self.insert_child(parent, index, child)
    }

    /// Moves `child` (with its subtree) under `parent` at `index`.
    ///
    /// `index` is interpreted after `child` has been detached from its
    /// current parent, so reordering within one parent uses final positions.
    ///
    /// # Errors
    /// - `NodeNotFound` when either handle is not live.
    /// - `Cycle` when `parent` is `child` or one of its descendants.
    /// - `IndexOutOfRange` when `index` exceeds the resulting child count.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> TreeResult<()> {
        self.require(child)?;
        let len = self.detached_child_count(parent, child)?;
        if parent == child || self.has_ancestor(parent, child) {
            return Err(TreeError::Cycle {
                node: child,
                parent,
            });
        }
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }

        self.orphan(child)?;
        if let Some(node) = self.node_mut(parent) {
            node.children.insert(index, child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// Removes `id` and all of its descendants, returning their payloads in
    /// pre-order.
    pub fn remove_subtree(&mut self, id: NodeId) -> TreeResult<Vec<T>> {
        let doomed: Vec<NodeId> = self.subtree_depth_first(id).collect();
        self.orphan(id)?;

        let mut removed = Vec::with_capacity(doomed.len());
        for current in doomed {
            if let Some(node) = self.slots.get_mut(current.0).and_then(Option::take) {
                self.live -= 1;
                removed.push(node.data);
            }
        }
        Ok(removed)
    }

    fn detached_child_count(&self, parent: NodeId, child: NodeId) -> TreeResult<usize> {
        let node = self.require(parent)?;
        let already_child = node.children.contains(&child);
        Ok(node.children.len() - usize::from(already_child))
    }

    fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    fn require(&self, id: NodeId) -> TreeResult<&Node<T>> {
        self.node(id).ok_or(TreeError::NodeNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeId, Tree};
    use crate::tree::TreeError;

    fn sample() -> (Tree<&'static str>, Vec<NodeId>) {
        let mut tree = Tree::new();
        let root = tree.insert_root("root");
        let a = tree.append(root, "a").expect("append a");
        let b = tree.append(root, "b").expect("append b");
        let c = tree.insert("c", Some(root), Some(1)).expect("insert c");
        let d = tree.append(c, "d").expect("append d");
        (tree, vec![root, a, b, c, d])
    }

    #[test]
    fn insert_respects_sibling_index() {
        let (tree, ids) = sample();
        assert_eq!(tree.children(ids[0]), &[ids[1], ids[3], ids[2]]);
        assert_eq!(tree.row(ids[3]), 1);
        assert_eq!(tree.row(ids[0]), 0);
        assert_eq!(tree.level(ids[4]), 2);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn insert_rejects_index_past_end() {
        let (mut tree, ids) = sample();
        let err = tree
            .insert("z", Some(ids[0]), Some(4))
            .expect_err("index 4 of 3 children must fail");
        assert_eq!(err, TreeError::IndexOutOfRange { index: 4, len: 3 });
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn sibling_navigation_stops_at_edges() {
        let (tree, ids) = sample();
        assert_eq!(tree.next_sibling(ids[1]), Some(ids[3]));
        assert_eq!(tree.prev_sibling(ids[1]), None);
        assert_eq!(tree.next_sibling(ids[2]), None);
        assert_eq!(tree.prev_sibling(ids[2]), Some(ids[3]));
        assert_eq!(tree.next_sibling(ids[0]), None);
        assert_eq!(tree.first_child(ids[2]), None);
        assert_eq!(tree.last_child(ids[0]), Some(ids[2]));
        assert!(tree.is_leaf(ids[4]));
        assert!(tree.is_root(ids[0]));
    }

    #[test]
    fn insert_child_rejects_cycles() {
        let (mut tree, ids) = sample();
        let err = tree
            .insert_child(ids[4], 0, ids[3])
            .expect_err("moving c under its child must fail");
        assert_eq!(
            err,
            TreeError::Cycle {
                node: ids[3],
                parent: ids[4]
            }
        );
        let err = tree
            .append_child(ids[3], ids[3])
            .expect_err("self-parenting must fail");
        assert!(matches!(err, TreeError::Cycle { .. }));
        assert_eq!(tree.children(ids[3]), &[ids[4]]);
    }

    #[test]
    fn insert_child_reorders_within_same_parent() {
        let (mut tree, ids) = sample();
        tree.insert_child(ids[0], 2, ids[1]).expect("move a to end");
        assert_eq!(tree.children(ids[0]), &[ids[3], ids[2], ids[1]]);
        assert_eq!(tree.parent(ids[1]), Some(ids[0]));
    }

    #[test]
    fn append_child_reparents_subtree() {
        let (mut tree, ids) = sample();
        tree.append_child(ids[1], ids[3]).expect("move c under a");
        assert_eq!(tree.children(ids[0]), &[ids[1], ids[2]]);
        assert_eq!(tree.children(ids[1]), &[ids[3]]);
        assert_eq!(tree.level(ids[4]), 3);
        assert!(tree.has_ancestor(ids[4], ids[1]));
    }

    #[test]
    fn orphan_makes_a_new_root() {
        let (mut tree, ids) = sample();
        tree.orphan(ids[3]).expect("orphan c");
        assert!(tree.is_root(ids[3]));
        assert_eq!(tree.children(ids[0]), &[ids[1], ids[2]]);
        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![ids[0], ids[3]]);
    }

    #[test]
    fn remove_subtree_returns_payloads_and_invalidates_handles() {
        let (mut tree, ids) = sample();
        let removed = tree.remove_subtree(ids[3]).expect("remove c");
        assert_eq!(removed, vec!["c", "d"]);
        assert!(!tree.contains(ids[3]));
        assert!(!tree.contains(ids[4]));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.children(ids[0]), &[ids[1], ids[2]]);

        let err = tree.orphan(ids[4]).expect_err("removed handle must fail");
        assert_eq!(err, TreeError::NodeNotFound(ids[4]));

        let fresh = tree.append(ids[0], "e").expect("append e");
        assert_ne!(fresh, ids[3]);
        assert_ne!(fresh, ids[4]);
    }
}
