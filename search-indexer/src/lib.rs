//! # Search Indexer
//!
//! Host-facing library for the search indexer.
//!
//! This crate exposes the `SearchIndexer` facade a content pipeline calls to
//! stage mutations and commit them, plus the configuration and wiring used
//! by the `search-indexer` binary.

pub mod config;
pub mod indexer;

pub use config::{ConfigurationError, Dependencies, IndexerConfig};
pub use indexer::SearchIndexer;

use thiserror::Error;

/// Errors that can occur while wiring the indexer.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigurationError),

    /// The dispatch client could not be created.
    #[error("Dispatch client error: {0}")]
    Dispatch(#[from] search_indexer_repository::DispatchError),
}
