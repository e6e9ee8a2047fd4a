//! Parsing of document batch responses.

use serde::Deserialize;

use crate::errors::DispatchError;

/// Body returned by the document batch API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchResponse {
    pub status: String,
    #[serde(default)]
    pub adds: u64,
    #[serde(default)]
    pub deletes: u64,
    #[serde(default)]
    pub errors: Vec<ResponseMessage>,
    #[serde(default)]
    pub warnings: Vec<ResponseMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseMessage {
    pub message: String,
}

impl BatchResponse {
    /// Parse a response body.
    ///
    /// A body that is not the expected JSON is a `ParseError`, a body whose
    /// status is not `success` is a `ServiceError`.
    pub fn parse(body: &str) -> Result<Self, DispatchError> {
        let response: BatchResponse = serde_json::from_str(body).map_err(|e| {
            DispatchError::parse(format!("Invalid batch response: {}: {}", e, body))
        })?;

        if response.status != "success" {
            return Err(DispatchError::service(format!(
                "Batch rejected with status '{}': {}",
                response.status,
                response.error_messages()
            )));
        }

        Ok(response)
    }

    /// Status line reported back to the commit coordinator.
    pub fn summary(&self) -> String {
        format!(
            "{} (adds={}, deletes={})",
            self.status, self.adds, self.deletes
        )
    }

    fn error_messages(&self) -> String {
        if self.errors.is_empty() {
            return "no error details".to_string();
        }
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
