//! Indexer settings.
//!
//! Settings can be deserialized from JSON (camelCase keys) or read from the
//! environment. Either way they are validated by `IndexerConfig::resolve`
//! before the indexer is built.

use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use search_indexer_pipeline::coordinator::DEFAULT_BATCH_SIZE;
use search_indexer_pipeline::{CommitConfig, PublicationFilter};
use search_indexer_repository::{
    AuthenticationMode, Credentials, DispatchClientConfig, DispatchRequest,
};

const ENV_DOCUMENT_ENDPOINT: &str = "CLOUDSEARCH_DOCUMENT_ENDPOINT";
const ENV_AUTHENTICATION: &str = "CLOUDSEARCH_AUTHENTICATION";
const ENV_ACCESS_KEY_ID: &str = "CLOUDSEARCH_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "CLOUDSEARCH_SECRET_ACCESS_KEY";
const ENV_INDEX_BATCH_SIZE: &str = "INDEX_BATCH_SIZE";
const ENV_ACTIVE_PUBLICATION_IDS: &str = "ACTIVE_PUBLICATION_IDS";
const ENV_CLEAR_ON_FAILURE: &str = "CLEAR_ON_FAILURE";
const ENV_DISPATCH_TIMEOUT_SECS: &str = "DISPATCH_TIMEOUT_SECS";

/// Default dispatch timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors raised while loading or validating the configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A required setting is absent or empty.
    #[error("Missing required setting: {0}")]
    Missing(String),

    #[error("Invalid document endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid index batch size: {0}")]
    InvalidBatchSize(String),

    #[error("Unknown authentication mode '{0}', expected 'implicit' or 'explicit'")]
    UnknownAuthentication(String),

    /// Only one half of an explicit key pair was configured.
    #[error("Explicit authentication needs both access_key_id and secret_access_key")]
    IncompleteCredentials,

    /// Explicit credentials were configured for a dispatch client that
    /// cannot sign requests with them.
    #[error("Explicit credentials are configured but the dispatch client does not sign requests")]
    UnsupportedCredentials,

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

/// Options accepted by `configure`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerConfig {
    /// Document endpoint of the remote index.
    pub document_endpoint: String,
    #[serde(default)]
    pub authentication: AuthenticationMode,
    /// Only read when `authentication` is explicit.
    #[serde(default, rename = "access_key_id")]
    pub access_key_id: Option<String>,
    /// Only read when `authentication` is explicit.
    #[serde(default, rename = "secret_access_key")]
    pub secret_access_key: Option<String>,
    #[serde(default = "default_batch_size")]
    pub index_batch_size: usize,
    /// Empty means every publication is active.
    #[serde(default)]
    pub active_publication_ids: Vec<String>,
    #[serde(default = "default_clear_on_failure")]
    pub clear_on_failure: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_clear_on_failure() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl fmt::Debug for IndexerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexerConfig")
            .field("document_endpoint", &self.document_endpoint)
            .field("authentication", &self.authentication)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("index_batch_size", &self.index_batch_size)
            .field("active_publication_ids", &self.active_publication_ids)
            .field("clear_on_failure", &self.clear_on_failure)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Validated settings, ready to build the indexer from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub request: DispatchRequest,
    pub filter: PublicationFilter,
    pub commit: CommitConfig,
}

impl IndexerConfig {
    /// Create a config with defaults for everything but the endpoint.
    pub fn new(document_endpoint: impl Into<String>) -> Self {
        Self {
            document_endpoint: document_endpoint.into(),
            authentication: AuthenticationMode::default(),
            access_key_id: None,
            secret_access_key: None,
            index_batch_size: DEFAULT_BATCH_SIZE,
            active_publication_ids: Vec::new(),
            clear_on_failure: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Load settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CLOUDSEARCH_DOCUMENT_ENDPOINT`: document endpoint (required)
    /// - `CLOUDSEARCH_AUTHENTICATION`: `implicit` or `explicit` (default: implicit)
    /// - `CLOUDSEARCH_ACCESS_KEY_ID` / `CLOUDSEARCH_SECRET_ACCESS_KEY`: explicit key pair
    /// - `INDEX_BATCH_SIZE`: documents per batch (default: 10)
    /// - `ACTIVE_PUBLICATION_IDS`: comma separated ids (default: all publications)
    /// - `CLEAR_ON_FAILURE`: clear staged mutations after a failed commit (default: true)
    /// - `DISPATCH_TIMEOUT_SECS`: timeout of a batch request (default: 30)
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let document_endpoint = get(ENV_DOCUMENT_ENDPOINT)
            .ok_or_else(|| ConfigurationError::Missing(ENV_DOCUMENT_ENDPOINT.to_string()))?;

        let authentication = match get(ENV_AUTHENTICATION) {
            Some(value) => parse_authentication(&value)?,
            None => AuthenticationMode::default(),
        };

        let active_publication_ids = get(ENV_ACTIVE_PUBLICATION_IDS)
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            document_endpoint,
            authentication,
            access_key_id: get(ENV_ACCESS_KEY_ID),
            secret_access_key: get(ENV_SECRET_ACCESS_KEY),
            index_batch_size: parse_setting(ENV_INDEX_BATCH_SIZE, get(ENV_INDEX_BATCH_SIZE))?
                .unwrap_or(DEFAULT_BATCH_SIZE),
            active_publication_ids,
            clear_on_failure: parse_setting(ENV_CLEAR_ON_FAILURE, get(ENV_CLEAR_ON_FAILURE))?
                .unwrap_or(true),
            request_timeout_secs: parse_setting(
                ENV_DISPATCH_TIMEOUT_SECS,
                get(ENV_DISPATCH_TIMEOUT_SECS),
            )?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    /// Validate the settings.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigurationError> {
        let endpoint = self.document_endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigurationError::Missing("documentEndpoint".to_string()));
        }
        let endpoint = Url::parse(endpoint).map_err(|e| ConfigurationError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let batch_size = NonZeroUsize::new(self.index_batch_size).ok_or_else(|| {
            ConfigurationError::InvalidBatchSize("must be greater than zero".to_string())
        })?;

        let credentials = self.credentials()?;
        let filter = PublicationFilter::new(self.active_publication_ids.iter().cloned());

        info!(
            endpoint = %endpoint,
            authentication = %self.authentication,
            batch_size = batch_size.get(),
            publications = ?self.active_publication_ids,
            clear_on_failure = self.clear_on_failure,
            "Indexer configured"
        );
        if filter.is_unrestricted() {
            info!("No active publications configured, all publications are indexed");
        }

        Ok(ResolvedConfig {
            request: DispatchRequest::new(endpoint, self.authentication, credentials),
            filter,
            commit: CommitConfig {
                batch_size,
                clear_on_failure: self.clear_on_failure,
            },
        })
    }

    /// Settings for the HTTP dispatch client.
    pub fn dispatch_client_config(&self) -> DispatchClientConfig {
        DispatchClientConfig::with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }

    fn credentials(&self) -> Result<Option<Credentials>, ConfigurationError> {
        if self.authentication == AuthenticationMode::Implicit {
            return Ok(None);
        }

        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        match (non_empty(&self.access_key_id), non_empty(&self.secret_access_key)) {
            (Some(access_key_id), Some(secret_access_key)) => {
                info!("Credentials are taken from the indexer configuration");
                Ok(Some(Credentials::new(access_key_id, secret_access_key)))
            }
            (None, None) => {
                info!("No credentials configured, relying on the dispatch client's credential chain");
                Ok(None)
            }
            _ => Err(ConfigurationError::IncompleteCredentials),
        }
    }
}

fn parse_authentication(value: &str) -> Result<AuthenticationMode, ConfigurationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "implicit" => Ok(AuthenticationMode::Implicit),
        "explicit" => Ok(AuthenticationMode::Explicit),
        _ => Err(ConfigurationError::UnknownAuthentication(value.to_string())),
    }
}

fn parse_setting<T: FromStr>(
    key: &str,
    value: Option<String>,
) -> Result<Option<T>, ConfigurationError> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigurationError::InvalidValue {
                    key: key.to_string(),
                    value: raw.clone(),
                })
        })
        .transpose()
}
