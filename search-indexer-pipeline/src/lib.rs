//! # Search Indexer Pipeline
//!
//! This crate provides the staging-and-commit engine that buffers document
//! mutations and flushes them, in size-bounded batches, to the remote index.
//!
//! ## Architecture
//!
//! 1. **Staging**: Holds pending adds, updates and removals keyed by id
//! 2. **Batcher**: Splits staged mutations into fixed-size batches
//! 3. **Coordinator**: Dispatches adds, then removals, then updates, and
//!    clears the registries afterwards
//! 4. **Errors**: Translates dispatch failures into one `IndexingFailure`

pub mod batcher;
pub mod coordinator;
pub mod errors;
pub mod staging;

pub use coordinator::{CommitConfig, CommitCoordinator, CommitOutcome, CommitSummary};
pub use errors::{CommitStage, IndexingFailure};
pub use staging::{IgnoreReason, PendingCounts, PublicationFilter, StageOutcome, StagingRegistry};
