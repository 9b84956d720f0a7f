//! HTTP transport seam.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::request::ProbeRequest;
use super::result::ProbeError;
use crate::config::{Config, MAX_BODY_SAMPLE_SIZE, MAX_HEADER_COUNT};
use crate::error_handling::InitializationError;
use crate::initialization::init_client;

/// What the transport saw of a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    /// Status code
    pub status: u16,
    /// Header name/value pairs (values that are not valid UTF-8 are lossily converted)
    pub headers: Vec<(String, String)>,
    /// Start of the response body, at most `MAX_BODY_SAMPLE_SIZE` bytes
    pub body_sample: String,
}

/// Sends one probe request.
///
/// Implementations must return `Err` only when no status code was received.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request`, giving up after `timeout`.
    async fn send(
        &self,
        request: ProbeRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, ProbeError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Arc<reqwest::Client>,
}

impl ReqwestTransport {
    /// Wraps an existing client. It should have redirects disabled.
    pub fn new(client: Arc<reqwest::Client>) -> Self {
        Self { client }
    }

    /// Builds the client from `config`.
    ///
    /// # Errors
    ///
    /// `InitializationError::HttpClientError` if the client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, InitializationError> {
        Ok(Self::new(init_client(config)?))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: ProbeRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, ProbeError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let mut response = builder
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(&e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .take(MAX_HEADER_COUNT)
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        // The status is already known, so a failing body read only shortens the sample
        let mut body = Vec::new();
        while body.len() < MAX_BODY_SAMPLE_SIZE {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let remaining = MAX_BODY_SAMPLE_SIZE - body.len();
                    body.extend_from_slice(&chunk[..chunk.len().min(remaining)]);
                }
                Ok(None) => break,
                Err(e) => {
                    log::debug!(
                        "Body read failed after status {} from {}: {}",
                        status,
                        request.url,
                        e
                    );
                    break;
                }
            }
        }

        Ok(TransportResponse {
            status,
            headers,
            body_sample: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}
