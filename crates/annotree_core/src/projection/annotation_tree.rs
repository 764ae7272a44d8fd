//! Annotation projection service.
//!
//! # Responsibility
//! - Build a data → group → record tree from each container's flat list.
//! - Route every structural edit through both the tree and the flat list.
//!
//! # Invariants
//! - Groups never nest and records never nest.
//! - Group names are unique among the groups of one data node.
//! - A record's `group` tag equals the name of its enclosing group node, and
//!   is absent for records directly under a data node.
//! - Within one parent, the flat list orders that parent's records the same
//!   way the tree orders its children.
//! - Every failing operation returns before mutating anything.

use super::error::{ProjectionError, ProjectionResult};
use super::node::{AnnotationNode, DataNode, GroupNode, NodeKind, RecordNode};
use crate::model::{
    annotation_label, annotation_list_mut, normalize_annotation_list, AnnotationId,
    AnnotationList, AnnotationRecord, DataContainer, DEFAULT_ATTRS_KEY,
};
use crate::tree::{DepthFirst, NodeId, ReverseDepthFirst, Tree};
use log::{debug, info, log_enabled, trace, Level};
use std::collections::HashMap;

const UNLABELLED_RECORD: &str = "{...}";

/// Projection of one or more containers' annotation lists as a tree.
#[derive(Debug)]
pub struct AnnotationTree<C> {
    tree: Tree<AnnotationNode<C>>,
}

impl<C: DataContainer> Default for AnnotationTree<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: DataContainer> AnnotationTree<C> {
    pub fn new() -> Self {
        Self { tree: Tree::new() }
    }

    /// Underlying generic tree, for read-only navigation.
    pub fn tree(&self) -> &Tree<AnnotationNode<C>> {
        &self.tree
    }

    /// Data nodes in build order.
    pub fn data_nodes(&self) -> Vec<NodeId> {
        self.tree
            .roots()
            .filter(|id| self.kind(*id) == Some(NodeKind::Data))
            .collect()
    }

    /// Takes ownership of `container` and projects the list stored at
    /// `attrs_key` under a new data node.
    ///
    /// Root-level order follows the first occurrence of each group name or
    /// ungrouped record in the list; records keep list order inside their
    /// group.
    ///
    /// # Errors
    /// - `Model` when the attribute exists but is not a valid annotation list.
    pub fn build(&mut self, mut container: C, attrs_key: &str) -> ProjectionResult<NodeId> {
        normalize_annotation_list(&mut container, attrs_key)?;
        let root = self.tree.insert_root(AnnotationNode::Data(DataNode {
            container,
            attrs_key: attrs_key.to_string(),
        }));
        let (records, groups) = self.populate(root)?;

        info!(
            "event=projection_build module=projection status=ok data_node={} attrs_key={} records={} groups={}",
            root, attrs_key, records, groups
        );
        self.trace_tree(root);
        Ok(root)
    }

    /// `build` with the `annotations` attribute key.
    pub fn build_default(&mut self, container: C) -> ProjectionResult<NodeId> {
        self.build(container, DEFAULT_ATTRS_KEY)
    }

    /// Discards the subtree of `node`'s data node and re-derives it from the
    /// container's current flat list.
    ///
    /// This is the recovery path after the list was edited behind the
    /// projection's back. Handles of the discarded nodes become invalid.
    pub fn rebuild(&mut self, node: NodeId) -> ProjectionResult<NodeId> {
        let data_node = self
            .owning_data_node(node)
            .ok_or(ProjectionError::NodeNotFound(node))?;
        if let Some(AnnotationNode::Data(data)) = self.tree.get_mut(data_node) {
            normalize_annotation_list(&mut data.container, &data.attrs_key)?;
        }

        for child in self.tree.children(data_node).to_vec() {
            self.tree.remove_subtree(child)?;
        }
        let (records, groups) = self.populate(data_node)?;

        info!(
            "event=projection_rebuild module=projection status=ok data_node={} records={} groups={}",
            data_node, records, groups
        );
        self.trace_tree(data_node);
        Ok(data_node)
    }

    /// Hands the containers back, in build order.
    pub fn into_containers(mut self) -> Vec<C> {
        let mut containers = Vec::new();
        for root in self.data_nodes() {
            let Ok(payloads) = self.tree.remove_subtree(root) else {
                continue;
            };
            if let Some(AnnotationNode::Data(data)) = payloads.into_iter().next() {
                containers.push(data.container);
            }
        }
        containers
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.tree.get(node).map(AnnotationNode::kind)
    }

    /// Container wrapped by a data node.
    pub fn container(&self, data_node: NodeId) -> Option<&C> {
        match self.tree.get(data_node)? {
            AnnotationNode::Data(data) => Some(data.container()),
            _ => None,
        }
    }

    /// Flat list owning the records of `node`'s data node.
    pub fn records(&self, node: NodeId) -> Option<&AnnotationList> {
        let data_node = self.owning_data_node(node)?;
        match self.tree.get(data_node)? {
            AnnotationNode::Data(data) => data.records(),
            _ => None,
        }
    }

    /// Record referenced by a record node.
    pub fn record(&self, node: NodeId) -> Option<&AnnotationRecord> {
        let record_id = self.tree.get(node)?.as_record()?.record_id();
        self.records(node)?.find(record_id)
    }

    /// Annotation `type` of a record node.
    pub fn record_type(&self, node: NodeId) -> Option<&str> {
        self.record(node).map(|record| record.kind.as_str())
    }

    /// Group child of `data_node` named `name`.
    pub fn group_named(&self, data_node: NodeId, name: &str) -> Option<NodeId> {
        self.tree.children(data_node).iter().copied().find(|child| {
            self.tree
                .get(*child)
                .and_then(AnnotationNode::as_group)
                .is_some_and(|group| group.name() == name)
        })
    }

    /// Data node at the root of `node`'s tree (`node` itself for data nodes).
    pub fn owning_data_node(&self, node: NodeId) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.tree.parents(node))
            .find(|id| self.kind(*id) == Some(NodeKind::Data))
    }

    /// Record identities under `node` in pre-order.
    pub fn flatten_records(&self, node: NodeId) -> Vec<AnnotationId> {
        self.tree
            .subtree_depth_first(node)
            .filter_map(|id| self.tree.get(id)?.as_record().map(RecordNode::record_id))
            .collect()
    }

    /// Display name: container name, group name or record label.
    pub fn name(&self, node: NodeId) -> Option<String> {
        match self.tree.get(node)? {
            AnnotationNode::Data(data) => Some(data.container().name().to_string()),
            AnnotationNode::Group(group) => Some(group.name().to_string()),
            AnnotationNode::Record(_) => {
                let label = self.record(node).map(annotation_label).unwrap_or_default();
                if label.is_empty() {
                    Some(UNLABELLED_RECORD.to_string())
                } else {
                    Some(label)
                }
            }
        }
    }

    /// Renames a group or relabels a record.
    ///
    /// Data node names belong to their container and are left unchanged.
    ///
    /// # Errors
    /// - `DuplicateName` when a sibling group already uses the trimmed name.
    /// - `RecordNotInList` when the record is missing from its flat list.
    pub fn set_name(&mut self, node: NodeId, name: &str) -> ProjectionResult<()> {
        match self.require_kind(node)? {
            NodeKind::Data => Ok(()),
            NodeKind::Group => self.rename_group(node, name),
            NodeKind::Record => self.relabel_record(node, name),
        }
    }

    /// Moves `node` to the end of `new_parent`'s children, moving its records
    /// to the end of the target data node's flat list.
    ///
    /// # Errors
    /// - `ImmutableNode` when `node` is a data node.
    /// - `Cycle` when `new_parent` is `node` or one of its descendants.
    /// - `InvalidHierarchy` when `new_parent` does not accept `node`'s kind.
    /// - `DuplicateName` when a moved group's name is taken in the target.
    /// - `RecordNotInList` when a moved record is missing from its list.
    pub fn set_parent(&mut self, node: NodeId, new_parent: NodeId) -> ProjectionResult<()> {
        let node_kind = self.require_kind(node)?;
        let parent_kind = self.require_kind(new_parent)?;
        if node_kind == NodeKind::Data {
            return Err(ProjectionError::ImmutableNode(node));
        }
        if self.tree.parent(node) == Some(new_parent) {
            return Ok(());
        }
        if new_parent == node || self.tree.has_ancestor(new_parent, node) {
            return Err(ProjectionError::Cycle {
                node,
                parent: new_parent,
            });
        }
        if !parent_kind.accepts(node_kind) {
            return Err(ProjectionError::InvalidHierarchy {
                child: node_kind,
                parent: parent_kind,
            });
        }
        if let Some(group) = self.tree.get(node).and_then(AnnotationNode::as_group) {
            if self.group_named(new_parent, group.name()).is_some() {
                return Err(ProjectionError::DuplicateName {
                    name: group.name().to_string(),
                });
            }
        }

        let source = self
            .owning_data_node(node)
            .ok_or(ProjectionError::NodeNotFound(node))?;
        let target = self
            .owning_data_node(new_parent)
            .ok_or(ProjectionError::NodeNotFound(new_parent))?;
        let record_ids = self.flatten_records(node);
        self.ensure_listed(source, &record_ids)?;
        self.list_mut(target)?;

        self.tree.append_child(new_parent, node)?;
        let placements = self.record_placements(node);
        let source_list = self.list_mut(source)?;
        let moved: Vec<(AnnotationRecord, Option<String>)> = placements
            .into_iter()
            .filter_map(|(id, group)| source_list.remove(id).map(|record| (record, group)))
            .collect();
        let target_list = self.list_mut(target)?;
        for (mut record, group) in moved {
            record.group = group;
            target_list.push(record);
        }

        debug!(
            "event=node_move module=projection status=ok node={} kind={} parent={} records={}",
            node,
            node_kind,
            new_parent,
            record_ids.len()
        );
        Ok(())
    }

    /// Moves `node` under `parent` at child position `index`.
    ///
    /// When `node` already sits under `parent` before `index`, the index is
    /// taken in pre-removal coordinates (dropping a node just below itself is
    /// a no-op). After a reorder, the flat list segment of `parent`'s records
    /// is rewritten in the new child order.
    ///
    /// # Errors
    /// - `IndexOutOfRange` when `index` exceeds `parent`'s child count.
    /// - Any `set_parent` error.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, node: NodeId) -> ProjectionResult<()> {
        self.require_kind(parent)?;
        self.require_kind(node)?;
        let len = self.tree.children(parent).len();
        if index > len {
            return Err(ProjectionError::IndexOutOfRange { index, len });
        }

        self.set_parent(node, parent)?;

        let position = self.tree.row(node);
        let target = if position < index { index - 1 } else { index };
        if position != target {
            self.tree.insert_child(parent, target, node)?;
            self.resync_child_order(parent)?;
            debug!(
                "event=node_reorder module=projection status=ok node={} parent={} from={} to={}",
                node, parent, position, target
            );
        }
        Ok(())
    }

    /// Removes a group (with its records) or a record from both the tree and
    /// the flat list, returning the removed records in tree order.
    ///
    /// # Errors
    /// - `ImmutableNode` when `node` is a data node.
    /// - `RecordNotInList` when a removed record is missing from its list.
    pub fn remove_node(&mut self, node: NodeId) -> ProjectionResult<Vec<AnnotationRecord>> {
        if self.require_kind(node)? == NodeKind::Data {
            return Err(ProjectionError::ImmutableNode(node));
        }
        let data_node = self
            .owning_data_node(node)
            .ok_or(ProjectionError::NodeNotFound(node))?;
        let record_ids = self.flatten_records(node);
        self.ensure_listed(data_node, &record_ids)?;

        self.tree.remove_subtree(node)?;
        let removed: Vec<AnnotationRecord> = if record_ids.is_empty() {
            Vec::new()
        } else {
            let list = self.list_mut(data_node)?;
            record_ids
                .iter()
                .filter_map(|id| list.remove(*id))
                .collect()
        };

        debug!(
            "event=node_remove module=projection status=ok node={} records={}",
            node,
            removed.len()
        );
        Ok(removed)
    }

    /// Creates an empty group under `data_node` at child position `index`.
    ///
    /// # Errors
    /// - `InvalidHierarchy` when `data_node` is not a data node.
    /// - `EmptyName` when `name` is blank.
    /// - `DuplicateName` when a sibling group already uses the trimmed name.
    /// - `IndexOutOfRange` when `index` exceeds the child count.
    pub fn insert_group(&mut self, data_node: NodeId, index: usize, name: &str) -> ProjectionResult<NodeId> {
        let parent_kind = self.require_kind(data_node)?;
        if !parent_kind.accepts(NodeKind::Group) {
            return Err(ProjectionError::InvalidHierarchy {
                child: NodeKind::Group,
                parent: parent_kind,
            });
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ProjectionError::EmptyName);
        }
        if self.group_named(data_node, name).is_some() {
            return Err(ProjectionError::DuplicateName {
                name: name.to_string(),
            });
        }
        let len = self.tree.children(data_node).len();
        if index > len {
            return Err(ProjectionError::IndexOutOfRange { index, len });
        }

        let group = self.tree.insert(
            AnnotationNode::Group(GroupNode {
                name: name.to_string(),
            }),
            Some(data_node),
            Some(index),
        )?;
        debug!(
            "event=group_insert module=projection status=ok node={} data_node={} index={}",
            group, data_node, index
        );
        Ok(group)
    }

    /// Adopts a new record under a data or group node at child position
    /// `index`, tagging it with the group name (or clearing the tag).
    ///
    /// # Errors
    /// - `InvalidHierarchy` when `parent` is a record node.
    /// - `IndexOutOfRange` when `index` exceeds the child count.
    pub fn insert_record(
        &mut self,
        parent: NodeId,
        index: usize,
        mut record: AnnotationRecord,
    ) -> ProjectionResult<NodeId> {
        let parent_kind = self.require_kind(parent)?;
        if !parent_kind.accepts(NodeKind::Record) {
            return Err(ProjectionError::InvalidHierarchy {
                child: NodeKind::Record,
                parent: parent_kind,
            });
        }
        let len = self.tree.children(parent).len();
        if index > len {
            return Err(ProjectionError::IndexOutOfRange { index, len });
        }
        let data_node = self
            .owning_data_node(parent)
            .ok_or(ProjectionError::NodeNotFound(parent))?;
        self.list_mut(data_node)?;

        record.group = self
            .tree
            .get(parent)
            .and_then(AnnotationNode::as_group)
            .map(|group| group.name().to_string());
        let record_id = record.id();
        let node = self.tree.insert(
            AnnotationNode::Record(RecordNode { record_id }),
            Some(parent),
            Some(index),
        )?;
        self.list_mut(data_node)?.push(record);
        self.resync_child_order(parent)?;

        debug!(
            "event=record_insert module=projection status=ok node={} parent={} index={}",
            node, parent, index
        );
        Ok(node)
    }

    /// Pre-order traversal of `node`'s subtree.
    pub fn subtree_depth_first(&self, node: NodeId) -> DepthFirst<'_, AnnotationNode<C>> {
        self.tree.subtree_depth_first(node)
    }

    /// Reverse pre-order traversal of `node`'s subtree.
    pub fn subtree_reverse_depth_first(
        &self,
        node: NodeId,
    ) -> ReverseDepthFirst<'_, AnnotationNode<C>> {
        self.tree.subtree_reverse_depth_first(node)
    }

    pub fn has_ancestor(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.tree.has_ancestor(node, ancestor)
    }

    /// Indented rendering of `node`'s subtree using display names.
    pub fn text_repr(&self, node: NodeId) -> String {
        self.tree
            .text_repr(node, |id, _| self.name(id).unwrap_or_default())
    }

    fn populate(&mut self, root: NodeId) -> ProjectionResult<(usize, usize)> {
        let entries: Vec<(AnnotationId, Option<String>)> = match self.tree.get(root) {
            Some(AnnotationNode::Data(data)) => data
                .records()
                .map(|list| {
                    list.iter()
                        .map(|record| (record.id(), record.group().map(str::to_string)))
                        .collect()
                })
                .unwrap_or_default(),
            _ => return Err(ProjectionError::NodeNotFound(root)),
        };

        let mut groups: HashMap<String, NodeId> = HashMap::new();
        for (record_id, group) in &entries {
            let parent = match group {
                Some(name) => match groups.get(name) {
                    Some(existing) => *existing,
                    None => {
                        let created = self.tree.append(
                            root,
                            AnnotationNode::Group(GroupNode { name: name.clone() }),
                        )?;
                        groups.insert(name.clone(), created);
                        created
                    }
                },
                None => root,
            };
            self.tree.append(
                parent,
                AnnotationNode::Record(RecordNode {
                    record_id: *record_id,
                }),
            )?;
        }
        Ok((entries.len(), groups.len()))
    }

    fn rename_group(&mut self, node: NodeId, new_name: &str) -> ProjectionResult<()> {
        let current = self
            .tree
            .get(node)
            .and_then(AnnotationNode::as_group)
            .map(|group| group.name().to_string())
            .ok_or(ProjectionError::NodeNotFound(node))?;
        let name = new_name.trim();
        if name.is_empty() || name == current {
            return Ok(());
        }
        if let Some(parent) = self.tree.parent(node) {
            if self
                .group_named(parent, name)
                .is_some_and(|other| other != node)
            {
                return Err(ProjectionError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }
        let data_node = self
            .owning_data_node(node)
            .ok_or(ProjectionError::NodeNotFound(node))?;
        let record_ids = self.flatten_records(node);
        self.ensure_listed(data_node, &record_ids)?;

        if let Some(AnnotationNode::Group(group)) = self.tree.get_mut(node) {
            group.name = name.to_string();
        }
        if !record_ids.is_empty() {
            let list = self.list_mut(data_node)?;
            for id in &record_ids {
                if let Some(record) = list.find_mut(*id) {
                    record.group = Some(name.to_string());
                }
            }
        }

        debug!(
            "event=group_rename module=projection status=ok node={} records={}",
            node,
            record_ids.len()
        );
        Ok(())
    }

    fn relabel_record(&mut self, node: NodeId, label: &str) -> ProjectionResult<()> {
        let record_id = self
            .tree
            .get(node)
            .and_then(AnnotationNode::as_record)
            .map(RecordNode::record_id)
            .ok_or(ProjectionError::NodeNotFound(node))?;
        let data_node = self
            .owning_data_node(node)
            .ok_or(ProjectionError::NodeNotFound(node))?;
        self.ensure_listed(data_node, &[record_id])?;

        if let Some(record) = self.list_mut(data_node)?.find_mut(record_id) {
            record.set_label(label);
        }
        debug!(
            "event=record_relabel module=projection status=ok node={}",
            node
        );
        Ok(())
    }

    /// Rewrites the flat list so `parent`'s records follow its child order.
    fn resync_child_order(&mut self, parent: NodeId) -> ProjectionResult<()> {
        let data_node = self
            .owning_data_node(parent)
            .ok_or(ProjectionError::NodeNotFound(parent))?;
        let ordered: Vec<AnnotationId> = self
            .tree
            .children(parent)
            .iter()
            .flat_map(|child| self.flatten_records(*child))
            .collect();

        let list = self.list_mut(data_node)?;
        for id in ordered {
            if let Some(record) = list.remove(id) {
                list.push(record);
            }
        }
        Ok(())
    }

    /// Record identities under `node` paired with their enclosing group name.
    fn record_placements(&self, node: NodeId) -> Vec<(AnnotationId, Option<String>)> {
        self.tree
            .subtree_depth_first(node)
            .filter_map(|id| {
                let record_id = self.tree.get(id)?.as_record()?.record_id();
                let group = self
                    .tree
                    .parent(id)
                    .and_then(|parent| self.tree.get(parent))
                    .and_then(AnnotationNode::as_group)
                    .map(|group| group.name().to_string());
                Some((record_id, group))
            })
            .collect()
    }

    fn ensure_listed(&self, data_node: NodeId, record_ids: &[AnnotationId]) -> ProjectionResult<()> {
        let list = match self.tree.get(data_node) {
            Some(AnnotationNode::Data(data)) => data.records(),
            _ => None,
        };
        match record_ids
            .iter()
            .find(|id| !list.is_some_and(|list| list.contains(**id)))
        {
            Some(missing) => Err(ProjectionError::RecordNotInList(*missing)),
            None => Ok(()),
        }
    }

    fn list_mut(&mut self, data_node: NodeId) -> ProjectionResult<&mut AnnotationList> {
        match self.tree.get_mut(data_node) {
            Some(AnnotationNode::Data(data)) => {
                Ok(annotation_list_mut(&mut data.container, &data.attrs_key)?)
            }
            _ => Err(ProjectionError::NodeNotFound(data_node)),
        }
    }

    fn require_kind(&self, node: NodeId) -> ProjectionResult<NodeKind> {
        self.kind(node).ok_or(ProjectionError::NodeNotFound(node))
    }

    fn trace_tree(&self, data_node: NodeId) {
        if log_enabled!(Level::Trace) {
            trace!(
                "event=projection_tree module=projection data_node={}\n{}",
                data_node,
                self.text_repr(data_node)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnnotationNode, AnnotationTree};
    use crate::model::{
        annotation_list_mut, AnnotationList, AnnotationRecord, Dataset, Dimensions,
        DEFAULT_ATTRS_KEY,
    };
    use crate::projection::ProjectionError;

    fn point(x: f64) -> AnnotationRecord {
        let mut dims = Dimensions::new();
        dims.insert("x", x);
        AnnotationRecord::new("point", dims)
    }

    #[test]
    fn record_node_without_label_uses_placeholder_name() {
        let list: AnnotationList = [AnnotationRecord::new("point", Dimensions::new())]
            .into_iter()
            .collect();
        let dataset = Dataset::new("trial").with_attribute(DEFAULT_ATTRS_KEY, list);
        let mut projection = AnnotationTree::new();
        let root = projection.build_default(dataset).expect("build should succeed");
        let record = projection.tree().children(root)[0];
        assert_eq!(projection.name(record).as_deref(), Some("{...}"));
        assert_eq!(projection.name(root).as_deref(), Some("trial"));
    }

    #[test]
    fn stale_record_reference_is_rejected_before_mutation() {
        let list: AnnotationList = [point(1.0).with_group("A"), point(2.0)].into_iter().collect();
        let dataset = Dataset::new("trial").with_attribute(DEFAULT_ATTRS_KEY, list);
        let mut projection = AnnotationTree::new();
        let root = projection.build_default(dataset).expect("build should succeed");
        let group = projection.tree().children(root)[0];
        let loose = projection.tree().children(root)[1];
        let loose_id = projection.flatten_records(loose)[0];

        if let Some(AnnotationNode::Data(data)) = projection.tree.get_mut(root) {
            let list = annotation_list_mut(&mut data.container, DEFAULT_ATTRS_KEY)
                .expect("list should exist");
            list.remove(loose_id);
        }

        let err = projection
            .set_parent(loose, group)
            .expect_err("missing record must fail");
        assert!(matches!(err, ProjectionError::RecordNotInList(id) if id == loose_id));
        assert_eq!(projection.tree().parent(loose), Some(root));
        assert_eq!(projection.tree().children(group).len(), 1);

        projection.rebuild(root).expect("rebuild should succeed");
        assert_eq!(projection.tree().children(root).len(), 1);
    }
}
