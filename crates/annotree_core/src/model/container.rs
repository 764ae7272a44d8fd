//! Data container contract and the flat annotation list it stores.
//!
//! # Responsibility
//! - Define what the projection needs from an external data container.
//! - Provide the ordered, identity-addressed record list stored under one
//!   attribute key.
//! - Provide `Dataset`, an in-memory container backed by a JSON attribute map.
//!
//! # Invariants
//! - Records are located by `AnnotationId`, never by field equality.
//! - Converting a JSON attribute into a typed list either fully succeeds or
//!   leaves the attribute untouched.

use super::annotation::{AnnotationId, AnnotationRecord};
use super::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attribute key used when the caller does not name one.
pub const DEFAULT_ATTRS_KEY: &str = "annotations";

/// Ordered list of annotation records owned by a container.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationList {
    records: Vec<AnnotationRecord>,
}

impl AnnotationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnnotationRecord> {
        self.records.iter()
    }

    /// Indexed read.
    pub fn get(&self, index: usize) -> Option<&AnnotationRecord> {
        self.records.get(index)
    }

    /// Index of the record with identity `id`.
    pub fn position(&self, id: AnnotationId) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.position(id).is_some()
    }

    pub fn find(&self, id: AnnotationId) -> Option<&AnnotationRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn find_mut(&mut self, id: AnnotationId) -> Option<&mut AnnotationRecord> {
        self.records.iter_mut().find(|record| record.id() == id)
    }

    /// Identities in list order.
    pub fn ids(&self) -> Vec<AnnotationId> {
        self.records.iter().map(AnnotationRecord::id).collect()
    }

    pub fn push(&mut self, record: AnnotationRecord) {
        self.records.push(record);
    }

    /// Indexed insert at `0..=len`.
    ///
    /// # Errors
    /// - Hands `record` back when `index` is past the end.
    pub fn insert(
        &mut self,
        index: usize,
        record: AnnotationRecord,
    ) -> Result<(), AnnotationRecord> {
        if index > self.records.len() {
            return Err(record);
        }
        self.records.insert(index, record);
        Ok(())
    }

    /// Removes the record with identity `id` and hands ownership back.
    pub fn remove(&mut self, id: AnnotationId) -> Option<AnnotationRecord> {
        let index = self.position(id)?;
        Some(self.records.remove(index))
    }
}

impl FromIterator<AnnotationRecord> for AnnotationList {
    fn from_iter<I: IntoIterator<Item = AnnotationRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AnnotationList {
    type Item = &'a AnnotationRecord;
    type IntoIter = std::slice::Iter<'a, AnnotationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// One value of a container's attribute map.
#[derive(Debug, PartialEq)]
pub enum AttrValue {
    /// Typed annotation list, addressed by record identity.
    Annotations(AnnotationList),
    /// Any other metadata, kept verbatim.
    Json(Value),
}

impl AttrValue {
    pub fn as_annotations(&self) -> Option<&AnnotationList> {
        match self {
            Self::Annotations(list) => Some(list),
            Self::Json(_) => None,
        }
    }

    pub fn as_annotations_mut(&mut self) -> Option<&mut AnnotationList> {
        match self {
            Self::Annotations(list) => Some(list),
            Self::Json(_) => None,
        }
    }

    /// Wire representation of this value.
    pub fn to_json(&self) -> ModelResult<Value> {
        match self {
            Self::Annotations(list) => Ok(serde_json::to_value(list)?),
            Self::Json(value) => Ok(value.clone()),
        }
    }
}

impl From<AnnotationList> for AttrValue {
    fn from(list: AnnotationList) -> Self {
        Self::Annotations(list)
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Contract the projection requires from a data container.
pub trait DataContainer {
    /// Display name of the container.
    fn name(&self) -> &str;
    /// Reads one attribute.
    fn attribute(&self, key: &str) -> Option<&AttrValue>;
    /// Mutable access to one attribute.
    fn attribute_mut(&mut self, key: &str) -> Option<&mut AttrValue>;
    /// Creates or replaces one attribute.
    fn set_attribute(&mut self, key: &str, value: AttrValue);
}

/// Converts a raw JSON array stored at `key` into a typed `AnnotationList`.
///
/// Missing attributes and already typed lists are left as they are.
///
/// # Errors
/// - `NotAnnotationList` when the attribute holds non-array JSON.
/// - `Json` when an array element is not a valid annotation record.
pub fn normalize_annotation_list<C: DataContainer + ?Sized>(
    container: &mut C,
    key: &str,
) -> ModelResult<()> {
    let converted = match container.attribute(key) {
        None | Some(AttrValue::Annotations(_)) => return Ok(()),
        Some(AttrValue::Json(Value::Null)) => AnnotationList::new(),
        Some(AttrValue::Json(value @ Value::Array(_))) => {
            serde_json::from_value::<AnnotationList>(value.clone())?
        }
        Some(AttrValue::Json(_)) => {
            return Err(ModelError::NotAnnotationList {
                key: key.to_string(),
            })
        }
    };
    container.set_attribute(key, AttrValue::Annotations(converted));
    Ok(())
}

/// Returns the typed list at `key`, creating an empty one when absent.
pub fn annotation_list_mut<'c, C: DataContainer + ?Sized>(
    container: &'c mut C,
    key: &str,
) -> ModelResult<&'c mut AnnotationList> {
    normalize_annotation_list(container, key)?;
    if container.attribute(key).is_none() {
        container.set_attribute(key, AttrValue::Annotations(AnnotationList::new()));
    }
    container
        .attribute_mut(key)
        .and_then(AttrValue::as_annotations_mut)
        .ok_or_else(|| ModelError::NotAnnotationList {
            key: key.to_string(),
        })
}

/// In-memory container with a named attribute map.
#[derive(Debug, Default, PartialEq)]
pub struct Dataset {
    name: String,
    attrs: BTreeMap<String, AttrValue>,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Builder helper storing `value` under `key`.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Loads the attribute map from a JSON object.
    ///
    /// Every attribute is kept as raw JSON until a projection claims it.
    pub fn from_json_str(name: impl Into<String>, text: &str) -> ModelResult<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(Self {
                name: name.into(),
                attrs: map
                    .into_iter()
                    .map(|(key, value)| (key, AttrValue::Json(value)))
                    .collect(),
            }),
            _ => Err(ModelError::NotAnObject),
        }
    }

    /// Attribute map in wire form.
    pub fn to_json(&self) -> ModelResult<Value> {
        let mut map = Map::new();
        for (key, value) in &self.attrs {
            map.insert(key.clone(), value.to_json()?);
        }
        Ok(Value::Object(map))
    }

    /// Typed annotation list at `key`, if it has been normalized.
    pub fn annotations(&self, key: &str) -> Option<&AnnotationList> {
        self.attrs.get(key).and_then(AttrValue::as_annotations)
    }

    pub fn attribute_keys(&self) -> impl Iterator<Item = &str> {
        self.attrs.keys().map(String::as_str)
    }
}

impl DataContainer for Dataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    fn attribute_mut(&mut self, key: &str) -> Option<&mut AttrValue> {
        self.attrs.get_mut(key)
    }

    fn set_attribute(&mut self, key: &str, value: AttrValue) {
        self.attrs.insert(key.to_string(), value);
    }
}
