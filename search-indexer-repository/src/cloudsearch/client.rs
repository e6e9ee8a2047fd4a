//! HTTP dispatch client implementation.
//!
//! This module provides the concrete implementation of `DispatchClient`
//! using `reqwest`.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::cloudsearch::response::BatchResponse;
use crate::config::DispatchClientConfig;
use crate::errors::DispatchError;
use crate::interfaces::DispatchClient;
use crate::types::DispatchRequest;
use search_indexer_shared::DocumentBatch;

/// Dispatch client posting batches over HTTP.
///
/// Requests are sent unsigned, which suits implicit authentication (a
/// signing proxy or an endpoint reachable from inside a trusted network).
/// Requests carrying explicit credentials are refused before any network
/// I/O.
///
/// # Example
///
/// ```ignore
/// let client = HttpDispatchClient::new(DispatchClientConfig::default())?;
/// let request = DispatchRequest::new(endpoint, AuthenticationMode::Implicit, None);
/// let status = client.submit(&batch, &request).await?;
/// ```
pub struct HttpDispatchClient {
    client: RwLock<Option<reqwest::Client>>,
    config: DispatchClientConfig,
}

impl HttpDispatchClient {
    /// Create a new client with its own connection pool.
    ///
    /// # Returns
    ///
    /// * `Ok(HttpDispatchClient)` - A new client instance
    /// * `Err(DispatchError::ClientError)` - If the HTTP client cannot be built
    pub fn new(config: DispatchClientConfig) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DispatchError::client(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            timeout_ms = config.request_timeout.as_millis() as u64,
            batch_path = %config.batch_path,
            "Created HTTP dispatch client"
        );

        Ok(Self {
            client: RwLock::new(Some(client)),
            config,
        })
    }

    /// Whether requests are signed with explicit credentials. They are not.
    pub fn signs_requests(&self) -> bool {
        false
    }

    /// Resolve the batch API URL under the document endpoint.
    fn batch_url(&self, endpoint: &Url) -> Result<Url, DispatchError> {
        let mut base = endpoint.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&self.config.batch_path).map_err(|e| {
            DispatchError::client(format!(
                "Invalid batch path '{}' for endpoint {}: {}",
                self.config.batch_path, endpoint, e
            ))
        })
    }

    fn map_send_error(err: reqwest::Error) -> DispatchError {
        if err.is_builder() {
            DispatchError::client(format!("Failed to build batch request: {}", err))
        } else {
            DispatchError::transport(err.to_string())
        }
    }

    #[instrument(skip(self, batch, request), fields(count = batch.len()))]
    async fn post_batch(
        &self,
        action: &'static str,
        batch: &DocumentBatch,
        request: &DispatchRequest,
    ) -> Result<String, DispatchError> {
        if request.credentials().is_some() && !self.signs_requests() {
            return Err(DispatchError::client(
                "Explicit credentials require request signing, which the HTTP dispatch client does not perform",
            ));
        }

        let client = self
            .client
            .read()
            .await
            .clone()
            .ok_or_else(|| DispatchError::client("Dispatch client has been destroyed"))?;

        let url = self.batch_url(request.endpoint())?;
        debug!(url = %url, action = action, "Posting document batch");

        let response = client
            .post(url)
            .json(batch)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::transport(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            error!(status = %status, body = %body, "Batch request failed");
            return Err(DispatchError::service(format!(
                "Batch request failed with status {}: {}",
                status, body
            )));
        }

        let parsed = BatchResponse::parse(&body)?;
        for warning in &parsed.warnings {
            warn!(action = action, warning = %warning.message, "Document batch warning");
        }

        Ok(parsed.summary())
    }
}

#[async_trait]
impl DispatchClient for HttpDispatchClient {
    async fn submit(
        &self,
        batch: &DocumentBatch,
        request: &DispatchRequest,
    ) -> Result<String, DispatchError> {
        self.post_batch("submit", batch, request).await
    }

    async fn remove(
        &self,
        batch: &DocumentBatch,
        request: &DispatchRequest,
    ) -> Result<String, DispatchError> {
        self.post_batch("remove", batch, request).await
    }

    async fn destroy(&self) {
        if self.client.write().await.take().is_some() {
            info!("HTTP dispatch client destroyed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DispatchErrorKind;
    use crate::types::{AuthenticationMode, Credentials};
    use search_indexer_shared::DocumentOperation;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn implicit_request(endpoint: &str) -> DispatchRequest {
        DispatchRequest::new(
            Url::parse(endpoint).unwrap(),
            AuthenticationMode::Implicit,
            None,
        )
    }

    fn batch() -> DocumentBatch {
        vec![DocumentOperation::delete("tcm:1-10")].into()
    }

    #[test]
    fn test_batch_url() {
        let client = HttpDispatchClient::new(DispatchClientConfig::default()).unwrap();

        let url = client
            .batch_url(&Url::parse("https://doc-test.cloudsearch.example.com").unwrap())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://doc-test.cloudsearch.example.com/2013-01-01/documents/batch"
        );

        let url = client
            .batch_url(&Url::parse("http://localhost:8080/proxy").unwrap())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/proxy/2013-01-01/documents/batch"
        );
    }

    #[tokio::test]
    async fn test_explicit_credentials_rejected() {
        let client = HttpDispatchClient::new(DispatchClientConfig::default()).unwrap();
        let request = DispatchRequest::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            AuthenticationMode::Explicit,
            Some(Credentials::new("AKIA", "secret")),
        );

        let err = client.submit(&batch(), &request).await.unwrap_err();

        assert_eq!(err.kind(), DispatchErrorKind::Client);
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let client = HttpDispatchClient::new(DispatchClientConfig::default()).unwrap();

        client.destroy().await;
        client.destroy().await;

        let err = client
            .remove(&batch(), &implicit_request("http://127.0.0.1:9"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), DispatchErrorKind::Client);
        assert!(err.message().contains("destroyed"));
    }

    /// Serve a single HTTP exchange with a canned response.
    ///
    /// Returns the server URL and a handle yielding the received request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (url, handle)
    }

    /// Read the request head and its body.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);

            if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&data[..end]).to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = HttpDispatchClient::new(DispatchClientConfig::default()).unwrap();
        let err = client
            .submit(&batch(), &implicit_request(&url))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DispatchErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_error_status_is_service_error() {
        let (url, server) = serve_once(
            "400 Bad Request",
            r#"{"status":"error","errors":[{"message":"Unknown field: titel"}]}"#,
        )
        .await;

        let client = HttpDispatchClient::new(DispatchClientConfig::default()).unwrap();
        let err = client
            .submit(&batch(), &implicit_request(&url))
            .await
            .unwrap_err();
        server.await.unwrap();

        assert_eq!(err.kind(), DispatchErrorKind::Service);
        assert!(err.message().contains("400"));
        assert!(err.message().contains("Unknown field: titel"));
    }

    #[tokio::test]
    async fn test_success_posts_batch_and_returns_summary() {
        let (url, server) = serve_once("200 OK", r#"{"status":"success","adds":1}"#).await;

        let client = HttpDispatchClient::new(DispatchClientConfig::default()).unwrap();
        let status = client
            .submit(&batch(), &implicit_request(&url))
            .await
            .unwrap();
        let request = server.await.unwrap();

        assert_eq!(status, "success (adds=1, deletes=0)");
        assert!(request.starts_with("POST /2013-01-01/documents/batch HTTP/1.1"));
        assert!(request.contains(r#"[{"type":"delete","id":"tcm:1-10"}]"#));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let (url, server) = serve_once("200 OK", "<html>gateway</html>").await;

        let client = HttpDispatchClient::new(DispatchClientConfig::default()).unwrap();
        let err = client
            .remove(&batch(), &implicit_request(&url))
            .await
            .unwrap_err();
        server.await.unwrap();

        assert_eq!(err.kind(), DispatchErrorKind::Parse);
    }
}
