//! Core domain logic for annotree.
//! Projects flat annotation lists stored on data containers as an editable
//! data → group → record tree.

pub mod logging;
pub mod model;
pub mod projection;
pub mod tree;

pub use logging::{default_log_level, init_logging, logging_status, LogConfig};
pub use model::{
    annotation_label, AnnotationId, AnnotationList, AnnotationRecord, AttrValue, DataContainer,
    Dataset, Dimensions, ModelError, ModelResult, Position, PositionValue, DEFAULT_ATTRS_KEY,
};
pub use projection::{AnnotationTree, NodeKind, ProjectionError, ProjectionResult};
pub use tree::{NodeId, Tree, TreeError, TreeResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
