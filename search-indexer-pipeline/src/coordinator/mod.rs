//! Coordinator module for the search indexer pipeline.
//!
//! Drives a commit: publication filter, then adds, removals and updates in
//! that fixed order, then the registry clear.
//!
//! The first dispatch error aborts the remaining steps of the commit. By
//! default the registries are still cleared, so mutations not yet dispatched
//! at the point of failure are dropped. Set `clear_on_failure` to `false` to
//! keep every staged mutation for the next commit instead.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::batcher;
use crate::errors::{CommitStage, IndexingFailure};
use crate::staging::{PublicationFilter, StagingRegistry};
use search_indexer_repository::{DispatchClient, DispatchRequest};
use search_indexer_shared::{DocumentOperation, IndexItem};

/// Default number of documents per dispatched batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Configuration for the commit coordinator.
#[derive(Debug, Clone)]
pub struct CommitConfig {
    /// Maximum number of documents per dispatched batch.
    pub batch_size: NonZeroUsize,
    /// Whether the registries are cleared after a failed commit.
    pub clear_on_failure: bool,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            clear_on_failure: true,
        }
    }
}

impl CommitConfig {
    /// Create a config with a custom batch size.
    pub fn with_batch_size(batch_size: NonZeroUsize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }
}

/// Counts of what a commit dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub adds: usize,
    pub removals: usize,
    pub updates: usize,
    pub batches: usize,
}

/// Result of a commit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The publication is not active; registries were left untouched.
    Filtered,
    Dispatched(CommitSummary),
}

#[derive(Debug, Clone, Copy)]
enum DispatchAction {
    Submit,
    Remove,
}

/// Drains a `StagingRegistry` into the injected `DispatchClient`.
///
/// Commits on one coordinator are serialized. Staging may continue
/// concurrently; whatever is staged before the final clear is cleared with
/// the rest.
pub struct CommitCoordinator {
    client: Arc<dyn DispatchClient>,
    request: DispatchRequest,
    filter: PublicationFilter,
    config: CommitConfig,
    commit_lock: Mutex<()>,
}

impl CommitCoordinator {
    pub fn new(
        client: Arc<dyn DispatchClient>,
        request: DispatchRequest,
        filter: PublicationFilter,
        config: CommitConfig,
    ) -> Self {
        Self {
            client,
            request,
            filter,
            config,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &Arc<dyn DispatchClient> {
        &self.client
    }

    /// Commit everything staged in `registry` for `publication_id`.
    ///
    /// # Returns
    ///
    /// * `Ok(CommitOutcome::Filtered)` - The publication is not active
    /// * `Ok(CommitOutcome::Dispatched(_))` - Every step succeeded
    /// * `Err(IndexingFailure)` - A dispatch failed; later steps were skipped
    #[instrument(skip(self, registry))]
    pub async fn commit(
        &self,
        registry: &StagingRegistry,
        publication_id: &str,
    ) -> Result<CommitOutcome, IndexingFailure> {
        if !self.filter.accepts(publication_id) {
            debug!(
                publication_id = %publication_id,
                "Publication is not active, not committing"
            );
            return Ok(CommitOutcome::Filtered);
        }

        let _guard = self.commit_lock.lock().await;

        let result = self.dispatch_staged(registry).await;
        let keep_staged = result.is_err() && !self.config.clear_on_failure;

        match &result {
            Ok(summary) => {
                info!(
                    adds = summary.adds,
                    removals = summary.removals,
                    updates = summary.updates,
                    batches = summary.batches,
                    "Commit completed"
                );
            }
            Err(failure) if keep_staged => {
                warn!(
                    error = %failure,
                    pending = registry.pending().total(),
                    "Commit failed, keeping staged mutations for the next commit"
                );
            }
            Err(_) => {}
        }

        if !keep_staged {
            info!("Clearing out registers");
            registry.clear();
        }

        result.map(CommitOutcome::Dispatched)
    }

    async fn dispatch_staged(
        &self,
        registry: &StagingRegistry,
    ) -> Result<CommitSummary, IndexingFailure> {
        let mut summary = CommitSummary::default();

        let adds = registry.adds_snapshot();
        summary.adds = adds.len();
        summary.batches += self.dispatch_upserts(CommitStage::Adds, &adds).await?;

        let removals: Vec<DocumentOperation> = registry
            .removals_snapshot()
            .into_iter()
            .map(|doc| DocumentOperation::delete(doc.id))
            .collect();
        summary.removals = removals.len();
        summary.batches += self
            .dispatch(CommitStage::Removals, DispatchAction::Remove, removals)
            .await?;

        // Updates go through the add path; the remote index upserts.
        let updates = registry.updates_snapshot();
        summary.updates = updates.len();
        summary.batches += self.dispatch_upserts(CommitStage::Updates, &updates).await?;

        Ok(summary)
    }

    async fn dispatch_upserts(
        &self,
        stage: CommitStage,
        items: &[IndexItem],
    ) -> Result<usize, IndexingFailure> {
        let operations = items
            .iter()
            .map(|item| {
                debug!(id = %item.id, fields = item.field_count(), "Adding document");
                DocumentOperation::add(item)
            })
            .collect();

        self.dispatch(stage, DispatchAction::Submit, operations).await
    }

    /// Dispatch operations batch by batch. Returns the number of batches sent.
    async fn dispatch(
        &self,
        stage: CommitStage,
        action: DispatchAction,
        operations: Vec<DocumentOperation>,
    ) -> Result<usize, IndexingFailure> {
        if operations.is_empty() {
            return Ok(0);
        }

        let documents = operations.len();
        let batches = batcher::into_batches(operations, self.config.batch_size);

        info!(
            stage = %stage,
            documents = documents,
            batches = batches.len(),
            batch_size = self.config.batch_size.get(),
            "Dispatching documents"
        );

        for (i, batch) in batches.iter().enumerate() {
            let index = i + 1;
            let result = match action {
                DispatchAction::Submit => self.client.submit(batch, &self.request).await,
                DispatchAction::Remove => self.client.remove(batch, &self.request).await,
            };
            let status = result.map_err(|e| IndexingFailure::translate(e, stage, index))?;

            info!(
                stage = %stage,
                batch = index,
                documents = batch.len(),
                status = %status,
                "Batch dispatched"
            );
        }

        Ok(batches.len())
    }
}
