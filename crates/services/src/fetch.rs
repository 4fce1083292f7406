use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::FetchError;

/// Transport for raw set documents.
///
/// The dataset layer only needs text back; where it comes from (HTTP,
/// local files in tests and tools) is an adapter concern.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch the document at `source` as text.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the document cannot be retrieved.
    async fn fetch(&self, source: &Url) -> Result<String, FetchError>;
}

/// Fetches documents over HTTP(S) with a per-request timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, source: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(source.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: source.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: source.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Transport {
            url: source.to_string(),
            message: e.to_string(),
        })
    }
}
