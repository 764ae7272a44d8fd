//! Traversal cursors over `Tree<T>`.
//!
//! Every cursor is a plain step function over a shared borrow of the tree:
//! it holds the next node and an end sentinel, never a stack. Creating a new
//! cursor restarts the traversal; the tree cannot change while one is alive.

use super::arena::{NodeId, Tree};
use std::iter::FusedIterator;

impl<T> Tree<T> {
    /// Pre-order successor of `id` within the whole tree.
    pub(crate) fn next_depth_first(&self, id: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(id) {
            return Some(child);
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if let Some(sibling) = self.next_sibling(current) {
                return Some(sibling);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Pre-order predecessor of `id` within the whole tree.
    pub(crate) fn prev_depth_first(&self, id: NodeId) -> Option<NodeId> {
        match self.prev_sibling(id) {
            Some(sibling) => Some(self.last_depth_first(sibling)),
            None => self.parent(id),
        }
    }

    /// Deepest last descendant of `id` (or `id` itself for a leaf).
    pub(crate) fn last_depth_first(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(child) = self.last_child(current) {
            current = child;
        }
        current
    }

    fn first_leaf(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(child) = self.first_child(current) {
            current = child;
        }
        current
    }

    fn next_leaf(&self, id: NodeId) -> Option<NodeId> {
        self.next_depth_first(id).map(|next| self.first_leaf(next))
    }

    fn prev_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = self.prev_depth_first(id);
        while let Some(current) = cursor {
            if self.is_leaf(current) {
                break;
            }
            cursor = self.prev_depth_first(current);
        }
        cursor
    }
}

/// Ancestors of one node, closest first.
pub struct Ancestors<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<'a, T> Ancestors<'a, T> {
    pub(super) fn new(tree: &'a Tree<T>, id: NodeId) -> Self {
        Self {
            tree,
            next: tree.parent(id),
        }
    }
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

impl<T> FusedIterator for Ancestors<'_, T> {}

impl<T> Clone for Ancestors<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            next: self.next,
        }
    }
}

macro_rules! bounded_cursor {
    ($(#[$meta:meta])* $name:ident, $step:ident) => {
        $(#[$meta])*
        pub struct $name<'a, T> {
            tree: &'a Tree<T>,
            next: Option<NodeId>,
            end: Option<NodeId>,
        }

        impl<T> Iterator for $name<'_, T> {
            type Item = NodeId;

            fn next(&mut self) -> Option<NodeId> {
                let current = self.next.filter(|id| Some(*id) != self.end)?;
                self.next = self.tree.$step(current);
                Some(current)
            }
        }

        impl<T> FusedIterator for $name<'_, T> {}

        impl<T> Clone for $name<'_, T> {
            fn clone(&self) -> Self {
                Self {
                    tree: self.tree,
                    next: self.next,
                    end: self.end,
                }
            }
        }
    };
}

bounded_cursor!(
    /// Pre-order cursor over one subtree.
    DepthFirst,
    next_depth_first
);
bounded_cursor!(
    /// Reverse pre-order cursor over one subtree.
    ReverseDepthFirst,
    prev_depth_first
);
bounded_cursor!(
    /// Depth-first cursor over the leaves of one subtree.
    Leaves,
    next_leaf
);
bounded_cursor!(
    /// Reverse depth-first cursor over the leaves of one subtree.
    ReverseLeaves,
    prev_leaf
);

impl<'a, T> DepthFirst<'a, T> {
    pub(super) fn new(tree: &'a Tree<T>, root: NodeId) -> Self {
        Self {
            tree,
            next: tree.contains(root).then_some(root),
            end: tree.next_depth_first(tree.last_depth_first(root)),
        }
    }
}

impl<'a, T> ReverseDepthFirst<'a, T> {
    pub(super) fn new(tree: &'a Tree<T>, root: NodeId) -> Self {
        Self {
            tree,
            next: tree
                .contains(root)
                .then(|| tree.last_depth_first(root)),
            end: tree.prev_depth_first(root),
        }
    }
}

impl<'a, T> Leaves<'a, T> {
    pub(super) fn new(tree: &'a Tree<T>, root: NodeId) -> Self {
        Self {
            tree,
            next: tree.contains(root).then(|| tree.first_leaf(root)),
            end: tree.next_leaf(tree.last_depth_first(root)),
        }
    }
}

impl<'a, T> ReverseLeaves<'a, T> {
    pub(super) fn new(tree: &'a Tree<T>, root: NodeId) -> Self {
        Self {
            tree,
            next: tree.contains(root).then(|| tree.last_depth_first(root)),
            end: tree.prev_leaf(tree.first_leaf(root)),
        }
    }
}
