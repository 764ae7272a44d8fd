//! Two-level annotation projection.
//!
//! # Responsibility
//! - Present each container's flat annotation list as data → group → record.
//! - Keep the flat list and the tree consistent across every edit.
//!
//! # Invariants
//! - The flat list is the source of truth; record nodes only reference
//!   records by identity.
//! - Rejected operations leave the tree and every flat list unchanged.

mod annotation_tree;
mod error;
mod node;

pub use annotation_tree::AnnotationTree;
pub use error::{ProjectionError, ProjectionResult};
pub use node::{AnnotationNode, DataNode, GroupNode, NodeKind, RecordNode};
