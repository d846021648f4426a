use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use wuwabot_core::config::ApiConfig;

/// Uniform transport-layer failure: non-200 status, network fault, or a
/// body that did not decode as JSON. Never crosses a command-handler
/// boundary raw; callers classify and rephrase it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("api transport failure: {message}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into() }
    }

    pub fn status(status: u16) -> Self {
        Self { status: Some(status), message: format!("unexpected response status {status}") }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self { status: None, message: format!("response body was not valid JSON: {}", message.into()) }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self {
            status: error.status().map(|status| status.as_u16()),
            message: error.to_string(),
        }
    }
}

/// Seam over the character API so the cache and lookup pipeline can be
/// exercised against scripted sources in tests.
#[async_trait]
pub trait CharacterSource: Send + Sync {
    /// `GET {base_url}/api/characters` - the roster of known slugs.
    async fn list_characters(&self) -> Result<Vec<String>, TransportError>;

    /// `GET {base_url}/api/characters/{slug}` - raw detail payload. The
    /// caller inspects `errorCode` before deserializing.
    async fn character_detail(&self, slug: &str) -> Result<Value, TransportError>;

    /// Best-effort reachability check against an image host.
    async fn probe_image(&self, url: &str) -> Result<(), TransportError>;
}

/// Thin wrapper over one shared `reqwest::Client`. No retries here;
/// retry policy belongs to the lookup pipeline.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(TransportError::from)?;

        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        debug!(%url, "requesting endpoint");
        let response = self.http.get(url).send().await.map_err(TransportError::from)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(TransportError::status(status.as_u16()));
        }

        let value =
            response.json::<Value>().await.map_err(|error| TransportError::decode(error.to_string()))?;
        debug!(%url, "api request successful");
        Ok(value)
    }
}

#[async_trait]
impl CharacterSource for ApiClient {
    async fn list_characters(&self) -> Result<Vec<String>, TransportError> {
        let value = self.fetch_json(&format!("{}/api/characters", self.base_url)).await?;
        serde_json::from_value::<Vec<String>>(value)
            .map_err(|error| TransportError::decode(error.to_string()))
    }

    async fn character_detail(&self, slug: &str) -> Result<Value, TransportError> {
        self.fetch_json(&format!("{}/api/characters/{slug}", self.base_url)).await
    }

    async fn probe_image(&self, url: &str) -> Result<(), TransportError> {
        debug!(%url, "probing image host");
        let response = self.http.get(url).send().await.map_err(TransportError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::status(status.as_u16()));
        }

        Ok(())
    }
}
