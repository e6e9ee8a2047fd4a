//! Dependency initialization and wiring for the search indexer.

use std::sync::Arc;
use tracing::info;

use crate::config::{ConfigurationError, IndexerConfig};
use crate::indexer::SearchIndexer;
use crate::IndexerError;
use search_indexer_repository::HttpDispatchClient;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured indexer, backed by the HTTP dispatch client.
    pub indexer: SearchIndexer,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See `IndexerConfig::from_env` for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexerError)` - If the configuration is invalid or the client cannot be built
    pub fn from_env() -> Result<Self, IndexerError> {
        let config = IndexerConfig::from_env()?;
        Self::new(&config)
    }

    /// Initialize all dependencies from an explicit configuration.
    ///
    /// Explicit credentials are refused here, since the HTTP client would
    /// reject every batch carrying them.
    pub fn new(config: &IndexerConfig) -> Result<Self, IndexerError> {
        let resolved = config.resolve()?;

        info!(
            endpoint = %resolved.request.endpoint(),
            timeout_secs = config.request_timeout_secs,
            "Initializing dependencies"
        );

        let client = HttpDispatchClient::new(config.dispatch_client_config())?;

        if resolved.request.credentials().is_some() && !client.signs_requests() {
            return Err(ConfigurationError::UnsupportedCredentials.into());
        }

        info!("Dispatch client created");

        let indexer = SearchIndexer::from_resolved(resolved, Arc::new(client));

        Ok(Self { indexer })
    }
}
