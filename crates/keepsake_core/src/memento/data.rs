//! Serialised memento tree.
//!
//! A `Data` node is either a lightweight reference (identity, resolve state
//! and type only), a full object with field payload, a collection, or a
//! standalone value carried by session handle.

use crate::model::adapter::AdapterHandle;
use crate::model::oid::Oid;
use crate::model::resolve_state::ResolveState;
use serde::{Deserialize, Serialize};

/// Type name recorded for one-to-many field collections.
pub const FIELD_COLLECTION_TYPE: &str = "list";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Data {
    Reference(ReferenceData),
    Object(ObjectData),
    Collection(CollectionData),
    Standalone(StandaloneData),
}

impl Data {
    /// `None` only for standalone values, which carry no identity.
    pub fn oid(&self) -> Option<&Oid> {
        match self {
            Self::Reference(data) => Some(&data.oid),
            Self::Object(data) => Some(&data.oid),
            Self::Collection(data) => Some(&data.oid),
            Self::Standalone(_) => None,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Reference(data) => &data.type_name,
            Self::Object(data) => &data.type_name,
            Self::Collection(data) => &data.type_name,
            Self::Standalone(data) => &data.type_name,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Reference(_) => "reference",
            Self::Object(_) => "object",
            Self::Collection(_) => "collection",
            Self::Standalone(_) => "standalone",
        }
    }

    /// Whether the tree can leave the session that produced it.
    pub fn is_portable(&self) -> bool {
        match self {
            Self::Reference(_) => true,
            Self::Standalone(_) => false,
            Self::Object(data) => data.fields.iter().all(|entry| entry.value.is_portable()),
            Self::Collection(data) => data.is_portable(),
        }
    }

    /// Number of full object payloads in the tree.
    pub fn inline_count(&self) -> usize {
        match self {
            Self::Object(data) => {
                1 + data
                    .fields
                    .iter()
                    .map(|entry| entry.value.inline_count())
                    .sum::<usize>()
            }
            Self::Collection(data) => data.inline_count(),
            Self::Reference(_) | Self::Standalone(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub oid: Oid,
    pub resolve_state: ResolveState,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    pub oid: Oid,
    pub resolve_state: ResolveState,
    pub type_name: String,
    pub fields: Vec<FieldEntry>,
}

impl ObjectData {
    pub fn new(oid: Oid, resolve_state: ResolveState, type_name: impl Into<String>) -> Self {
        Self {
            oid,
            resolve_state,
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, id: impl Into<String>, value: FieldData) {
        self.fields.push(FieldEntry {
            id: id.into(),
            value,
        });
    }

    pub fn entry(&self, id: &str) -> Option<&FieldData> {
        self.fields
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.value)
    }

    /// True when at least one field carries a non-null value.
    pub fn contains_field(&self) -> bool {
        self.fields
            .iter()
            .any(|entry| !matches!(entry.value, FieldData::Null))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub id: String,
    pub value: FieldData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldData {
    Null,
    Encoded(String),
    Reference(Box<Data>),
    Collection(CollectionData),
}

impl FieldData {
    fn is_portable(&self) -> bool {
        match self {
            Self::Null | Self::Encoded(_) => true,
            Self::Reference(data) => data.is_portable(),
            Self::Collection(data) => data.is_portable(),
        }
    }

    fn inline_count(&self) -> usize {
        match self {
            Self::Null | Self::Encoded(_) => 0,
            Self::Reference(data) => data.inline_count(),
            Self::Collection(data) => data.inline_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionData {
    pub oid: Oid,
    pub resolve_state: ResolveState,
    pub type_name: String,
    pub element_type: String,
    pub elements: Vec<Data>,
}

impl CollectionData {
    fn is_portable(&self) -> bool {
        self.elements.iter().all(Data::is_portable)
    }

    fn inline_count(&self) -> usize {
        self.elements.iter().map(Data::inline_count).sum()
    }
}

/// Value without identity, re-injected unchanged on restore.
///
/// The handle is only meaningful inside the session that captured it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandaloneData {
    pub type_name: String,
    pub adapter: AdapterHandle,
}
