//! Node variants of the annotation projection.

use crate::model::{AnnotationId, AnnotationList, AttrValue, DataContainer};
use std::fmt::{Display, Formatter};

/// Structural kind of a projection node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Data,
    Group,
    Record,
}

impl NodeKind {
    /// Returns whether a node of kind `child` may live directly under `self`.
    ///
    /// Data nodes are always roots; groups live only under data nodes;
    /// records live under data or group nodes.
    pub fn accepts(self, child: NodeKind) -> bool {
        match child {
            NodeKind::Data => false,
            NodeKind::Group => self == NodeKind::Data,
            NodeKind::Record => matches!(self, NodeKind::Data | NodeKind::Group),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Group => "group",
            Self::Record => "record",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root node wrapping one data container.
#[derive(Debug)]
pub struct DataNode<C> {
    pub(super) container: C,
    pub(super) attrs_key: String,
}

impl<C: DataContainer> DataNode<C> {
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Attribute key holding this container's flat record list.
    pub fn attrs_key(&self) -> &str {
        &self.attrs_key
    }

    /// Flat record list, `None` while the container has no list yet.
    pub fn records(&self) -> Option<&AnnotationList> {
        self.container
            .attribute(&self.attrs_key)
            .and_then(AttrValue::as_annotations)
    }
}

/// Named group of records under a data node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub(super) name: String,
}

impl GroupNode {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Non-owning reference to one record of the enclosing data node's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordNode {
    pub(super) record_id: AnnotationId,
}

impl RecordNode {
    pub fn record_id(&self) -> AnnotationId {
        self.record_id
    }
}

/// Payload of one projection tree node.
#[derive(Debug)]
pub enum AnnotationNode<C> {
    Data(DataNode<C>),
    Group(GroupNode),
    Record(RecordNode),
}

impl<C> AnnotationNode<C> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Data(_) => NodeKind::Data,
            Self::Group(_) => NodeKind::Group,
            Self::Record(_) => NodeKind::Record,
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Self::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordNode> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}
