//! Annotation data model.
//!
//! # Responsibility
//! - Define annotation records, their positions and display labels.
//! - Define the data container contract and the flat list it stores.
//!
//! # Invariants
//! - Every record carries a stable identity that is never serialized.
//! - The flat list is the single owner of its records.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod annotation;
pub mod container;
pub mod label;

pub use annotation::{AnnotationId, AnnotationRecord, Dimensions, Position, PositionValue};
pub use container::{
    annotation_list_mut, normalize_annotation_list, AnnotationList, AttrValue, DataContainer,
    Dataset, DEFAULT_ATTRS_KEY,
};
pub use label::{annotation_label, format_general};

/// Result type used by model decoding operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors from decoding containers and annotation lists.
#[derive(Debug)]
pub enum ModelError {
    /// JSON text or value could not be decoded.
    Json(serde_json::Error),
    /// Dataset JSON root is not an object.
    NotAnObject,
    /// Attribute exists but does not hold a list of annotation records.
    NotAnnotationList { key: String },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid annotation json: {err}"),
            Self::NotAnObject => write!(f, "dataset attributes must be a json object"),
            Self::NotAnnotationList { key } => {
                write!(f, "attribute `{key}` is not an annotation list")
            }
        }
    }
}

impl Error for ModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::NotAnObject => None,
            Self::NotAnnotationList { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
