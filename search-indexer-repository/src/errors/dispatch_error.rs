//! Dispatch error types.
//!
//! This module defines the errors a `DispatchClient` can raise while
//! submitting or removing a batch.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while dispatching a batch to the remote index.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Network or IO failure (connection refused, timeout, broken body).
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The request or response body could not be encoded or decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The remote index rejected the batch.
    #[error("Service error: {0}")]
    ServiceError(String),

    /// Client misuse or an internal client failure.
    #[error("Client error: {0}")]
    ClientError(String),
}

/// Classification of a `DispatchError`, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchErrorKind {
    Transport,
    Parse,
    Service,
    Client,
}

impl DispatchErrorKind {
    /// Human-readable label used as a prefix in surfaced failures.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchErrorKind::Transport => "TransportError",
            DispatchErrorKind::Parse => "ParseError",
            DispatchErrorKind::Service => "ServiceError",
            DispatchErrorKind::Client => "ClientError",
        }
    }
}

impl fmt::Display for DispatchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl DispatchError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a service error.
    pub fn service(msg: impl Into<String>) -> Self {
        Self::ServiceError(msg.into())
    }

    /// Create a client error.
    pub fn client(msg: impl Into<String>) -> Self {
        Self::ClientError(msg.into())
    }

    pub fn kind(&self) -> DispatchErrorKind {
        match self {
            Self::TransportError(_) => DispatchErrorKind::Transport,
            Self::ParseError(_) => DispatchErrorKind::Parse,
            Self::ServiceError(_) => DispatchErrorKind::Service,
            Self::ClientError(_) => DispatchErrorKind::Client,
        }
    }

    /// The message without the classification prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::TransportError(msg)
            | Self::ParseError(msg)
            | Self::ServiceError(msg)
            | Self::ClientError(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_message() {
        let err = DispatchError::service("batch rejected");

        assert_eq!(err.kind(), DispatchErrorKind::Service);
        assert_eq!(err.message(), "batch rejected");
        assert_eq!(err.to_string(), "Service error: batch rejected");
    }

    #[test]
    fn test_labels() {
        assert_eq!(DispatchError::transport("x").kind().label(), "TransportError");
        assert_eq!(DispatchError::parse("x").kind().label(), "ParseError");
        assert_eq!(DispatchError::client("x").kind().to_string(), "ClientError");
    }
}
