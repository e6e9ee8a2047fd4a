//! Dispatch client trait definition.

use async_trait::async_trait;

use crate::errors::DispatchError;
use crate::types::DispatchRequest;
use search_indexer_shared::DocumentBatch;

/// Performs the network calls that submit or delete a batch against the
/// remote search index.
///
/// Implementations are injected into the commit coordinator, which enables
/// substituting a test double with no network dependency.
///
/// # Contract
///
/// Both dispatch operations are single attempts. Retry and backoff, if any,
/// belong to the implementation; the caller treats every `Err` as final for
/// the current commit. The returned status string is only logged.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`.
#[async_trait]
pub trait DispatchClient: Send + Sync {
    /// Submit a batch of `add` operations. Also used for updates, which the
    /// remote index treats as upserts.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The status reported by the remote index
    /// * `Err(DispatchError)` - Transport, parse, service or client failure
    async fn submit(
        &self,
        batch: &DocumentBatch,
        request: &DispatchRequest,
    ) -> Result<String, DispatchError>;

    /// Submit a batch of `delete` operations.
    async fn remove(
        &self,
        batch: &DocumentBatch,
        request: &DispatchRequest,
    ) -> Result<String, DispatchError>;

    /// Release pooled connections and other process-wide resources.
    ///
    /// Must be idempotent.
    async fn destroy(&self);
}
