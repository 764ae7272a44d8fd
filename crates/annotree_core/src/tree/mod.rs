//! Generic ordered-tree primitive.
//!
//! # Responsibility
//! - Own tree nodes in an arena addressed by stable `NodeId` handles.
//! - Provide parent/child linkage, sibling navigation and depth-first cursors.
//! - Render any subtree as indented text for debugging output.
//!
//! # Invariants
//! - A node's `children` vector is the only ownership edge; `parent` is a
//!   back-pointer kept in sync by every linkage operation.
//! - A node appears in at most one parent's `children`.
//! - Linkage operations never create cycles.
//! - Removed handles are never reused for another node.
//!
//! This module has no knowledge of annotations; see `crate::projection`.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod arena;
mod cursor;
mod render;

pub use arena::{NodeId, Tree};
pub use cursor::{Ancestors, DepthFirst, Leaves, ReverseDepthFirst, ReverseLeaves};

/// Result type used by tree linkage operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors from generic tree linkage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// Handle does not address a live node.
    NodeNotFound(NodeId),
    /// Linking `node` under `parent` would make `node` its own ancestor.
    Cycle { node: NodeId, parent: NodeId },
    /// Sibling index is outside `0..=len`.
    IndexOutOfRange { index: usize, len: usize },
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "tree node not found: {id}"),
            Self::Cycle { node, parent } => {
                write!(f, "linking node {node} under {parent} would create a cycle")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "sibling index {index} out of range 0..={len}")
            }
        }
    }
}

impl Error for TreeError {}
