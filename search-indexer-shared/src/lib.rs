//! # Search Indexer Shared
//!
//! Types shared by every layer of the search indexer: the items a content
//! pipeline stages, and the document operations sent to the remote index.

mod documents;
mod operations;

pub use documents::{BinaryItem, DocumentRef, IndexItem, MutationKind};
pub use operations::{DocumentBatch, DocumentOperation, FieldValue};
