//! HTTP client abstraction for testability.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::debug;

use super::error::LandmassError;
use crate::BoxFuture;

/// Minimal async HTTP GET used to download the raw landmass.
pub trait HttpClient: Send + Sync {
    /// Fetch `url`, returning the body. Non-success statuses are errors.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, LandmassError>>;
}

/// Default User-Agent string for HTTP requests.
const DEFAULT_USER_AGENT: &str = concat!("territory/", env!("CARGO_PKG_VERSION"));

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the given request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, LandmassError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| LandmassError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, LandmassError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| LandmassError::Http(format!("Request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(LandmassError::Http(format!(
                    "HTTP {} from {}",
                    response.status(),
                    url
                )));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| LandmassError::Http(format!("Failed to read response: {}", e)))?;
            debug!(url, bytes = body.len(), "Downloaded");
            Ok(body.to_vec())
        })
    }
}

/// Canned-response client for tests.
///
/// Counts calls so tests can assert that cached data avoids the network.
pub struct MockHttpClient {
    response: Result<Vec<u8>, String>,
    calls: AtomicUsize,
}

impl MockHttpClient {
    /// Always answer with `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            response: Ok(body.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `get` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for MockHttpClient {
    fn get<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, LandmassError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.response.clone().map_err(LandmassError::Http);
        Box::pin(async move { response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let client = MockHttpClient::ok(b"body".to_vec());
        assert_eq!(client.get("http://x").await.unwrap(), b"body");
        assert_eq!(client.get("http://x").await.unwrap(), b"body");
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let client = MockHttpClient::failing("boom");
        let err = client.get("http://x").await.unwrap_err();
        assert!(matches!(err, LandmassError::Http(ref m) if m == "boom"));
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::with_timeout(5).is_ok());
    }
}
