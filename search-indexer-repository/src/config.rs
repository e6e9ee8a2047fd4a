//! Configuration types for the HTTP dispatch client.

use std::time::Duration;

/// Configuration for the HttpDispatchClient.
#[derive(Debug, Clone)]
pub struct DispatchClientConfig {
    /// Timeout applied to every batch request.
    pub request_timeout: Duration,
    /// Path of the document batch API, relative to the document endpoint.
    pub batch_path: String,
}

impl Default for DispatchClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            batch_path: "2013-01-01/documents/batch".to_string(),
        }
    }
}

impl DispatchClientConfig {
    /// Create a config with a custom request timeout.
    pub fn with_request_timeout(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            ..Self::default()
        }
    }
}
