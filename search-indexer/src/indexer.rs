//! The `SearchIndexer` facade.
//!
//! Holds one staging registry and one commit coordinator. Staging calls are
//! synchronous and safe from any thread; `commit` flushes everything staged
//! for the active publications.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::config::{ConfigurationError, IndexerConfig, ResolvedConfig};
use search_indexer_pipeline::{
    CommitCoordinator, CommitOutcome, IndexingFailure, StageOutcome, StagingRegistry,
};
use search_indexer_repository::DispatchClient;
use search_indexer_shared::{BinaryItem, DocumentRef, IndexItem, MutationKind};

pub struct SearchIndexer {
    registry: StagingRegistry,
    coordinator: CommitCoordinator,
    destroyed: AtomicBool,
}

impl SearchIndexer {
    /// Validate `config` and build an indexer dispatching through `client`.
    pub fn configure(
        config: &IndexerConfig,
        client: Arc<dyn DispatchClient>,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::from_resolved(config.resolve()?, client))
    }

    /// Build an indexer from settings that were already validated.
    pub fn from_resolved(resolved: ResolvedConfig, client: Arc<dyn DispatchClient>) -> Self {
        Self {
            registry: StagingRegistry::new(resolved.filter.clone()),
            coordinator: CommitCoordinator::new(
                client,
                resolved.request,
                resolved.filter,
                resolved.commit,
            ),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn add_item_to_index(&self, item: IndexItem) -> StageOutcome {
        self.registry.stage_add(item)
    }

    pub fn update_item_in_index(&self, item: IndexItem) -> StageOutcome {
        self.registry.stage_update(item)
    }

    pub fn remove_item_from_index(&self, doc: DocumentRef) -> StageOutcome {
        self.registry.stage_remove(doc)
    }

    /// Stage any mutation.
    pub fn stage(&self, mutation: MutationKind) -> StageOutcome {
        self.registry.stage(mutation)
    }

    /// Binary content is not indexed; the call is accepted and dropped.
    pub fn add_binary_to_index(&self, item: &BinaryItem) {
        debug!(id = %item.id, "Binary indexing is not supported, ignoring");
    }

    pub fn remove_binary_from_index(&self, doc: &DocumentRef) {
        debug!(id = %doc.id, "Binary indexing is not supported, ignoring");
    }

    /// Flush all staged mutations to the remote index.
    #[instrument(skip(self))]
    pub async fn commit(&self, publication_id: &str) -> Result<CommitOutcome, IndexingFailure> {
        self.coordinator.commit(&self.registry, publication_id).await
    }

    /// Release the dispatch client. Later calls are no-ops.
    pub async fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            debug!("Search indexer already destroyed");
            return;
        }

        self.coordinator.client().destroy().await;
        info!(pending = self.registry.pending().total(), "Search indexer destroyed");
    }

    pub fn registry(&self) -> &StagingRegistry {
        &self.registry
    }
}
