//! Error types for the search indexer pipeline.
//!
//! Every failure raised by the dispatch client during a commit is translated
//! exactly once, at the commit boundary, into an `IndexingFailure`.

use std::fmt;

use thiserror::Error;
use tracing::error;

use search_indexer_repository::{DispatchError, DispatchErrorKind};

/// The step of a commit during which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitStage {
    Adds,
    Removals,
    Updates,
}

impl CommitStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitStage::Adds => "adds",
            CommitStage::Removals => "removals",
            CommitStage::Updates => "updates",
        }
    }
}

impl fmt::Display for CommitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error surface of a commit.
///
/// Displayed as `"<KindLabel>: <message>"`, e.g.
/// `"ServiceError: Batch request failed with status 400 Bad Request: ..."`.
#[derive(Debug, Clone, Error)]
#[error("{}: {message}", .kind.label())]
pub struct IndexingFailure {
    /// Classification of the underlying dispatch error.
    pub kind: DispatchErrorKind,
    /// Commit step that failed.
    pub stage: CommitStage,
    /// 1-based index of the failing batch within its step.
    pub batch: usize,
    /// Message of the underlying error.
    pub message: String,
    #[source]
    pub cause: DispatchError,
}

impl IndexingFailure {
    /// Translate a dispatch error, logging it with its commit context.
    pub fn translate(cause: DispatchError, stage: CommitStage, batch: usize) -> Self {
        error!(
            kind = %cause.kind(),
            stage = %stage,
            batch = batch,
            error = %cause,
            "Dispatch failed during commit"
        );

        Self {
            kind: cause.kind(),
            stage,
            batch,
            message: cause.message().to_string(),
            cause,
        }
    }
}
