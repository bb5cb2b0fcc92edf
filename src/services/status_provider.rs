use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

use crate::services::poller::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum StatusFetchError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Config error: {0}")]
    Config(String),
}

/// Source of deposit status codes
#[async_trait]
pub trait StatusProvider: Send + Sync {
    async fn fetch_status(&self, transaction_id: &str) -> Result<StatusCode, StatusFetchError>;
}

#[derive(Deserialize)]
struct StatusResponse {
    status: StatusCode,
}

/// Status endpoint client
/// GET {base_url}/deposits/{transaction_id}/status -> {"status": <code>}
pub struct HttpStatusProvider {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpStatusProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StatusFetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StatusFetchError::Config(format!("invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StatusFetchError::Config(format!(
                "base URL cannot carry a path: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StatusFetchError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    /// The transaction id is always a single, percent-encoded path segment
    fn status_url(&self, transaction_id: &str) -> Result<Url, StatusFetchError> {
        // "." and ".." would be dropped by the URL normaliser
        if transaction_id.is_empty() || transaction_id == "." || transaction_id == ".." {
            return Err(StatusFetchError::Config(format!(
                "unusable transaction id {:?}",
                transaction_id
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StatusFetchError::Config("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["deposits", transaction_id, "status"]);
        Ok(url)
    }
}

#[async_trait]
impl StatusProvider for HttpStatusProvider {
    async fn fetch_status(&self, transaction_id: &str) -> Result<StatusCode, StatusFetchError> {
        let mut request = self.client.get(self.status_url(transaction_id)?);
        if let Some(key) = &self.api_key {
            request = request.header("API-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StatusFetchError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StatusFetchError::Api(format!(
                "API returned status: {}",
                response.status()
            )));
        }

        let body: StatusResponse = response
            .json()
            .await
            .map_err(|e| StatusFetchError::Parse(e.to_string()))?;

        Ok(body.status)
    }
}
