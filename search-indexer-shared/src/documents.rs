//! Items staged by the content pipeline.
//!
//! An `IndexItem` carries the full field payload for adds and updates, a
//! `DocumentRef` identifies a document for removal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document to be added to or updated in the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexItem {
    /// The unique index id of the document.
    pub id: String,
    /// The publication the item belongs to. Only used for filtering.
    pub publication_id: String,
    /// Field name to ordered values.
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<Value>>,
}

impl IndexItem {
    /// Create an item without any fields.
    pub fn new(id: impl Into<String>, publication_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            publication_id: publication_id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Append a single value to a field.
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.entry(field.into()).or_default().push(value.into());
        self
    }

    /// Set a field to the given ordered values, replacing any previous ones.
    pub fn with_values<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.fields
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Number of fields carried by the item.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Identifies a document by unique id within a publication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub publication_id: String,
}

impl DocumentRef {
    pub fn new(id: impl Into<String>, publication_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            publication_id: publication_id.into(),
        }
    }
}

/// A binary document (PDF, office file, ...).
///
/// Binary indexing is not implemented; the type exists so the binary entry
/// points of the indexer have a typed argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryItem {
    pub id: String,
    pub publication_id: String,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub content: Vec<u8>,
}

/// A single staged mutation.
///
/// Serialized as an internally tagged object, e.g.
/// `{"action": "remove", "id": "tcm:1-2", "publication_id": "1"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum MutationKind {
    Add(IndexItem),
    Update(IndexItem),
    Remove(DocumentRef),
}

impl MutationKind {
    /// The unique id the mutation targets.
    pub fn id(&self) -> &str {
        match self {
            MutationKind::Add(item) | MutationKind::Update(item) => &item.id,
            MutationKind::Remove(doc) => &doc.id,
        }
    }

    /// The publication the mutation belongs to.
    pub fn publication_id(&self) -> &str {
        match self {
            MutationKind::Add(item) | MutationKind::Update(item) => &item.publication_id,
            MutationKind::Remove(doc) => &doc.publication_id,
        }
    }
}
