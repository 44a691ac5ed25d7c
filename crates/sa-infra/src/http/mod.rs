//! REST adapters.
//!
//! Every endpoint answers with the same envelope:
//! `{ "success": bool, "data": ..., "pagination"?: ..., "error"?: string }`.
//! [`HttpClient`] owns the connection pool, the base URL and the mapping of
//! transport and envelope failures onto [`GatewayError`].

mod badges;
mod beacon;
mod gateway;
mod upload;

pub use badges::HttpBadgeCounts;
pub use beacon::HttpBeacon;
pub use gateway::HttpGateway;
pub use upload::HttpUploader;

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use sa_core::ports::{GatewayError, Pagination};

#[derive(Debug, Error)]
pub enum HttpSetupError {
    #[error("invalid base url '{0}'")]
    InvalidBaseUrl(String),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<D> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<D>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Shared HTTP plumbing for all adapters of one backend.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpClient {
    /// `timeout` bounds each request at the transport level; zero disables it.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, HttpSetupError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(HttpSetupError::InvalidBaseUrl(base_url));
        }

        let mut builder = reqwest::Client::builder();
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Sends `request` and unwraps the envelope. A `success: true` answer
    /// without `data` yields `None`.
    pub(crate) async fn send<D: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<D>, GatewayError> {
        let response = request.send().await.map_err(|err| self.map_error(err))?;
        let status = response.status();
        let body = response.text().await.map_err(|err| self.map_error(err))?;
        debug!(status = status.as_u16(), bytes = body.len(), "http response");

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let envelope: Envelope<D> = serde_json::from_str(&body)
            .map_err(|err| GatewayError::Decode(err.to_string()))?;
        if !envelope.success {
            return Err(GatewayError::Server {
                status: Some(status.as_u16()),
                message: envelope
                    .error
                    .clone()
                    .unwrap_or_else(|| "request was not successful".to_string()),
            });
        }
        Ok(envelope)
    }

    /// Like [`HttpClient::send`] but `data` must be present.
    pub(crate) async fn send_data<D: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<D, GatewayError> {
        self.send(request)
            .await?
            .data
            .ok_or_else(|| GatewayError::Decode("response has no data".to_string()))
    }

    fn map_error(&self, error: reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            GatewayError::Timeout {
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else if let Some(status) = error.status() {
            GatewayError::Server {
                status: Some(status.as_u16()),
                message: error.to_string(),
            }
        } else if error.is_decode() {
            GatewayError::Decode(error.to_string())
        } else {
            GatewayError::Network(error.to_string())
        }
    }
}

/// Non-2xx answers: prefer the envelope's `error`, fall back to the reason
/// phrase.
fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
    GatewayError::Server {
        status: Some(status.as_u16()),
        message,
    }
}
