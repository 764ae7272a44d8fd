//! Errors from annotation projection operations.

use super::node::NodeKind;
use crate::model::{AnnotationId, ModelError};
use crate::tree::{NodeId, TreeError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Errors from projection operations.
///
/// Every variant is raised before the tree or any flat list is mutated.
#[derive(Debug)]
pub enum ProjectionError {
    /// Handle does not address a live projection node.
    NodeNotFound(NodeId),
    /// A sibling group under the same data node already uses `name`.
    DuplicateName { name: String },
    /// Data nodes cannot be moved or removed.
    ImmutableNode(NodeId),
    /// Move would place `node` under itself or one of its descendants.
    Cycle { node: NodeId, parent: NodeId },
    /// Parent kind does not accept the child kind.
    InvalidHierarchy { child: NodeKind, parent: NodeKind },
    /// Child index is outside `0..=len`.
    IndexOutOfRange { index: usize, len: usize },
    /// Group name is blank after trim.
    EmptyName,
    /// Record node references a record missing from its data node's list.
    RecordNotInList(AnnotationId),
    /// Container attribute could not be read as an annotation list.
    Model(ModelError),
}

impl Display for ProjectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "projection node not found: {id}"),
            Self::DuplicateName { name } => write!(f, "group already exists: {name}"),
            Self::ImmutableNode(id) => {
                write!(f, "data node {id} is immutable; only groups and records move")
            }
            Self::Cycle { node, parent } => write!(
                f,
                "move would create cycle: node {node} under parent {parent}"
            ),
            Self::InvalidHierarchy { child, parent } => {
                write!(f, "a {child} node cannot be placed under a {parent} node")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "child index {index} out of range 0..={len}")
            }
            Self::EmptyName => write!(f, "group name must not be blank"),
            Self::RecordNotInList(id) => {
                write!(f, "annotation {id} is missing from its container list")
            }
            Self::Model(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Model(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TreeError> for ProjectionError {
    fn from(value: TreeError) -> Self {
        match value {
            TreeError::NodeNotFound(id) => Self::NodeNotFound(id),
            TreeError::Cycle { node, parent } => Self::Cycle { node, parent },
            TreeError::IndexOutOfRange { index, len } => Self::IndexOutOfRange { index, len },
        }
    }
}

impl From<ModelError> for ProjectionError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}
