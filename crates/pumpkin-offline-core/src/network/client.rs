//! HTTP client used by the agent to reach the game's origin.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::debug;

use crate::models::{Request, Response};

use super::NetworkError;

/// HTTP request timeout in seconds.
/// Generous enough for the wasm module on a slow link.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Something that can put a request on the wire.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Resolve with whatever the server answered, error status included.
    /// Fail only when no response arrived at all.
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// reqwest-backed fetcher.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, NetworkError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let response = self
            .client
            .request(request.method.into(), request.url.clone())
            .send()
            .await?;

        let status = response.status();
        let headers = header_pairs(response.headers());
        let body = response.bytes().await?;

        debug!(url = %request.url, status = status.as_u16(), bytes = body.len(), "Fetched from network");
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Flatten a header map. Values that are not valid UTF-8 are kept with the
/// bad bytes replaced, so the header survives being stored and read back.
fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = match value.to_str() {
                Ok(v) => v.to_string(),
                Err(_) => {
                    debug!(header = %name, "Header value is not UTF-8, storing lossily");
                    String::from_utf8_lossy(value.as_bytes()).into_owned()
                }
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}
