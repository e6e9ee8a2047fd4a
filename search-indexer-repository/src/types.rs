//! Request types shared by every dispatch.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// How the dispatch client authenticates against the remote index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationMode {
    /// Credentials come from the environment of the client (instance role,
    /// signing proxy, ...).
    #[default]
    Implicit,
    /// Credentials are supplied through configuration.
    Explicit,
}

impl AuthenticationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationMode::Implicit => "implicit",
            AuthenticationMode::Explicit => "explicit",
        }
    }
}

impl fmt::Display for AuthenticationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An access key pair. The secret is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Immutable description of where and how a batch is dispatched.
///
/// Credentials are only retained when the mode is `Explicit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    endpoint: Url,
    authentication: AuthenticationMode,
    credentials: Option<Credentials>,
}

impl DispatchRequest {
    pub fn new(
        endpoint: Url,
        authentication: AuthenticationMode,
        credentials: Option<Credentials>,
    ) -> Self {
        let credentials = match authentication {
            AuthenticationMode::Explicit => credentials,
            AuthenticationMode::Implicit => None,
        };

        Self {
            endpoint,
            authentication,
            credentials,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn authentication(&self) -> AuthenticationMode {
        self.authentication
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("https://doc-test.eu-west-1.cloudsearch.amazonaws.com").unwrap()
    }

    #[test]
    fn test_implicit_drops_credentials() {
        let request = DispatchRequest::new(
            endpoint(),
            AuthenticationMode::Implicit,
            Some(Credentials::new("AKIA", "secret")),
        );

        assert!(request.credentials().is_none());
        assert_eq!(request.authentication(), AuthenticationMode::Implicit);
    }

    #[test]
    fn test_explicit_keeps_credentials() {
        let request = DispatchRequest::new(
            endpoint(),
            AuthenticationMode::Explicit,
            Some(Credentials::new("AKIA", "secret")),
        );

        assert_eq!(request.credentials().unwrap().access_key_id, "AKIA");
        assert_eq!(request.endpoint(), &endpoint());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", Credentials::new("AKIA", "very-secret"));

        assert!(debug.contains("AKIA"));
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn test_authentication_mode_serde() {
        let mode: AuthenticationMode = serde_json::from_str("\"explicit\"").unwrap();
        assert_eq!(mode, AuthenticationMode::Explicit);
        assert_eq!(AuthenticationMode::default().to_string(), "implicit");
    }
}
