//! Annotation record model.
//!
//! # Responsibility
//! - Define the canonical field map of one annotation and its wire shape.
//! - Give every record a process-local identity independent of its content.
//!
//! # Invariants
//! - `id` is assigned at construction/decoding and never serialized, so two
//!   records with equal fields are still distinct records.
//! - Records are not `Clone`: a record moves between lists, it is never copied.
//! - Unknown wire fields survive a decode/encode cycle through `extra`.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt::Formatter;
use uuid::Uuid;

/// Identity of one annotation record.
pub type AnnotationId = Uuid;

/// Coordinates of one dimension: a single value or an ordered series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionValue {
    Scalar(f64),
    Series(Vec<f64>),
}

impl PositionValue {
    /// Values in order; a scalar is a one-element slice.
    pub fn values(&self) -> &[f64] {
        match self {
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::Series(values) => values,
        }
    }
}

impl From<f64> for PositionValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for PositionValue {
    fn from(values: Vec<f64>) -> Self {
        Self::Series(values)
    }
}

/// Named dimensions in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dimensions(Vec<(String, PositionValue)>);

impl Dimensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `dim`, replacing an existing entry in place.
    pub fn insert(&mut self, dim: impl Into<String>, value: impl Into<PositionValue>) {
        let dim = dim.into();
        let value = value.into();
        match self.0.iter_mut().find(|(name, _)| *name == dim) {
            Some(entry) => entry.1 = value,
            None => self.0.push((dim, value)),
        }
    }

    pub fn get(&self, dim: &str) -> Option<&PositionValue> {
        self.0
            .iter()
            .find(|(name, _)| name == dim)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PositionValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Dimensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Dimensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DimensionsVisitor;

        impl<'de> Visitor<'de> for DimensionsVisitor {
            type Value = Dimensions;

            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of dimension name to coordinate values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Dimensions, A::Error> {
                let mut dims = Dimensions::new();
                while let Some((name, value)) = access.next_entry::<String, PositionValue>()? {
                    dims.insert(name, value);
                }
                Ok(dims)
            }
        }

        deserializer.deserialize_map(DimensionsVisitor)
    }
}

/// Geometry of an annotation.
///
/// Named dimensions keep their declaration order; positional coordinates are
/// addressed by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    Named(Dimensions),
    Positional(Vec<PositionValue>),
}

impl Default for Position {
    fn default() -> Self {
        Self::Named(Dimensions::new())
    }
}

impl Position {
    /// Dimension label and coordinates per dimension; positional entries are
    /// labelled by their index.
    pub fn entries(&self) -> Vec<(String, &PositionValue)> {
        match self {
            Self::Named(dims) => dims
                .iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            Self::Positional(values) => values
                .iter()
                .enumerate()
                .map(|(index, value)| (index.to_string(), value))
                .collect(),
        }
    }
}

impl From<Dimensions> for Position {
    fn from(dims: Dimensions) -> Self {
        Self::Named(dims)
    }
}

/// One annotation as stored in a container's flat list.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    #[serde(skip, default = "Uuid::new_v4")]
    id: AnnotationId,
    /// Serialized as `type`; compared case-insensitively by label rules.
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Position,
    /// Multi-line text; the first line doubles as the display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Opaque styling options owned by the presentation layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Map<String, Value>>,
    /// Group tag; the projection keeps it equal to the enclosing group name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnnotationRecord {
    /// Creates a record with a fresh identity and no optional fields.
    pub fn new(kind: impl Into<String>, position: impl Into<Position>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            position: position.into(),
            text: None,
            style: None,
            group: None,
            extra: Map::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Effective group tag; blank tags count as ungrouped.
    pub fn group(&self) -> Option<&str> {
        self.group
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Replaces the first line of `text` with the trimmed `label`.
    ///
    /// Creates `text` when absent and drops it when the label is blank and
    /// there are no further lines.
    pub fn set_label(&mut self, label: &str) {
        let label = label.trim();
        let next = match self.text.as_deref() {
            None | Some("") => (!label.is_empty()).then(|| label.to_string()),
            Some(text) => match text.split_once('\n') {
                Some((_, rest)) => Some(format!("{label}\n{rest}")),
                None if label.is_empty() => None,
                None => Some(label.to_string()),
            },
        };
        self.text = next;
    }
}

#[cfg(test)]
mod tests {
    use super::{AnnotationRecord, Dimensions, Position, PositionValue};
    use serde_json::json;

    #[test]
    fn decodes_named_position_in_declaration_order() {
        let record: AnnotationRecord = serde_json::from_value(json!({
            "type": "arrow",
            "position": {"time": [10, 20], "lat": 30},
            "text": "some text\nwith lines",
        }))
        .expect("record should decode");

        let entries = record.position.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "time");
        assert_eq!(entries[0].1, &PositionValue::Series(vec![10.0, 20.0]));
        assert_eq!(entries[1].0, "lat");
        assert_eq!(entries[1].1, &PositionValue::Scalar(30.0));
        assert_eq!(record.group(), None);
    }

    #[test]
    fn decodes_positional_position_with_index_keys() {
        let record: AnnotationRecord = serde_json::from_value(json!({
            "type": "polyline",
            "position": [[10, 20, 30], [30, 40, 50]],
        }))
        .expect("record should decode");

        assert!(matches!(record.position, Position::Positional(_)));
        let keys: Vec<String> = record
            .position
            .entries()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, vec!["0", "1"]);
    }

    #[test]
    fn preserves_unknown_fields_and_omits_identity() {
        let raw = json!({
            "type": "point",
            "position": {"x": 1},
            "group": "A",
            "source": "manual",
        });
        let record: AnnotationRecord = serde_json::from_value(raw).expect("record should decode");
        assert_eq!(record.extra.get("source"), Some(&json!("manual")));

        let encoded = serde_json::to_value(&record).expect("record should encode");
        assert_eq!(
            encoded,
            json!({
                "type": "point",
                "position": {"x": 1.0},
                "group": "A",
                "source": "manual",
            })
        );
    }

    #[test]
    fn equal_fields_do_not_imply_equal_identity() {
        let mut dims = Dimensions::new();
        dims.insert("x", 1.0);
        let first = AnnotationRecord::new("point", dims.clone());
        let second = AnnotationRecord::new("point", dims);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn blank_group_counts_as_ungrouped() {
        let record = AnnotationRecord::new("point", Position::default()).with_group("  ");
        assert_eq!(record.group(), None);
    }

    #[test]
    fn set_label_rewrites_only_the_first_line() {
        let mut record =
            AnnotationRecord::new("point", Position::default()).with_text("old\nbody line");
        record.set_label("  new  ");
        assert_eq!(record.text.as_deref(), Some("new\nbody line"));

        let mut bare = AnnotationRecord::new("point", Position::default());
        bare.set_label("label");
        assert_eq!(bare.text.as_deref(), Some("label"));
        bare.set_label(" ");
        assert_eq!(bare.text, None);
    }
}
