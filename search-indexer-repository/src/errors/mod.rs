//! Error types for the search indexer repository.

mod dispatch_error;

pub use dispatch_error::{DispatchError, DispatchErrorKind};
