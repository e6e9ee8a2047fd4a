//! Wire-level document operations.
//!
//! A `DocumentBatch` serializes to the JSON array accepted by the remote
//! document endpoint:
//!
//! ```json
//! [
//!   {"type": "add", "id": "tcm:1-10", "fields": {"title": "Hello", "tags": ["a", "b"]}},
//!   {"type": "delete", "id": "tcm:1-11"}
//! ]
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::documents::IndexItem;

/// A field value on the wire. A field with exactly one value is sent as a
/// scalar, any other number of values as a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(Value),
    List(Vec<Value>),
}

impl From<Vec<Value>> for FieldValue {
    fn from(mut values: Vec<Value>) -> Self {
        if values.len() == 1 {
            FieldValue::Scalar(values.remove(0))
        } else {
            FieldValue::List(values)
        }
    }
}

/// One operation inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentOperation {
    Add {
        id: String,
        fields: BTreeMap<String, FieldValue>,
    },
    Delete {
        id: String,
    },
}

impl DocumentOperation {
    /// Build an `add` operation from a staged item.
    pub fn add(item: &IndexItem) -> Self {
        let fields = item
            .fields
            .iter()
            .map(|(name, values)| (name.clone(), FieldValue::from(values.clone())))
            .collect();

        DocumentOperation::Add {
            id: item.id.clone(),
            fields,
        }
    }

    /// Build a `delete` operation. Only the id is carried.
    pub fn delete(id: impl Into<String>) -> Self {
        DocumentOperation::Delete { id: id.into() }
    }

    pub fn id(&self) -> &str {
        match self {
            DocumentOperation::Add { id, .. } | DocumentOperation::Delete { id } => id,
        }
    }
}

/// An ordered group of operations submitted in one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DocumentBatch {
    operations: Vec<DocumentOperation>,
}

impl DocumentBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[DocumentOperation] {
        &self.operations
    }

    /// Ids of the operations, in batch order.
    pub fn ids(&self) -> Vec<&str> {
        self.operations.iter().map(DocumentOperation::id).collect()
    }
}

impl From<Vec<DocumentOperation>> for DocumentBatch {
    fn from(operations: Vec<DocumentOperation>) -> Self {
        Self { operations }
    }
}

impl FromIterator<DocumentOperation> for DocumentBatch {
    fn from_iter<I: IntoIterator<Item = DocumentOperation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_value_becomes_scalar() {
        let item = IndexItem::new("tcm:1-10", "1")
            .with_value("title", "Hello")
            .with_values("tags", ["a", "b"]);

        let op = DocumentOperation::add(&item);

        match op {
            DocumentOperation::Add { ref fields, .. } => {
                assert_eq!(fields["title"], FieldValue::Scalar(json!("Hello")));
                assert_eq!(
                    fields["tags"],
                    FieldValue::List(vec![json!("a"), json!("b")])
                );
            }
            _ => panic!("expected add operation"),
        }
    }

    #[test]
    fn test_empty_field_is_sent_as_empty_list() {
        let item = IndexItem::new("tcm:1-10", "1").with_values("empty", Vec::<Value>::new());

        let value = serde_json::to_value(DocumentOperation::add(&item)).unwrap();

        assert_eq!(value["fields"]["empty"], json!([]));
    }

    #[test]
    fn test_wire_payload() {
        let item = IndexItem::new("tcm:1-10", "1")
            .with_value("title", "Hello")
            .with_values("tags", ["a", "b"]);

        let batch: DocumentBatch = vec![
            DocumentOperation::add(&item),
            DocumentOperation::delete("tcm:1-11"),
        ]
        .into();

        let value = serde_json::to_value(&batch).unwrap();

        assert_eq!(
            value,
            json!([
                {"type": "add", "id": "tcm:1-10", "fields": {"tags": ["a", "b"], "title": "Hello"}},
                {"type": "delete", "id": "tcm:1-11"}
            ])
        );
    }

    #[test]
    fn test_batch_ids() {
        let batch: DocumentBatch = ["a", "b", "c"]
            .into_iter()
            .map(DocumentOperation::delete)
            .collect();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.ids(), vec!["a", "b", "c"]);
        assert!(!batch.is_empty());
        assert!(DocumentBatch::new().is_empty());
    }
}
