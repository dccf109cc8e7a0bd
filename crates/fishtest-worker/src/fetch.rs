//! Downloads with bounded retries.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{WorkerError, WorkerResult};

/// User agent sent with every request; the GitHub API rejects anonymous clients.
pub const USER_AGENT: &str = concat!("fishtest-worker/", env!("CARGO_PKG_VERSION"));

/// HTTP downloader that never hands back an empty or partial payload.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    attempts: u32,
    backoff_unit: Duration,
}

impl Fetcher {
    /// Create a fetcher using the attempt budget and backoff unit of `config`.
    pub fn new(config: &Config) -> WorkerResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(WorkerError::HttpClient)?;

        Ok(Self {
            client,
            attempts: config.fetch_attempts,
            backoff_unit: config.backoff_unit,
        })
    }

    /// Delay before the retry that follows attempt `attempt` (zero based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * (attempt + 1)
    }

    /// Download `url` with the configured attempt budget.
    pub async fn get(&self, url: &str) -> WorkerResult<Vec<u8>> {
        self.fetch(url, self.attempts).await
    }

    /// Download and decode a JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> WorkerResult<T> {
        let bytes = self.get(url).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Download `url`, making at most `max_attempts` attempts.
    ///
    /// Fails with the error of the last attempt once the budget is spent.
    pub async fn fetch(&self, url: &str, max_attempts: u32) -> WorkerResult<Vec<u8>> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.fetch_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    let backoff = self.backoff(attempt);
                    warn!(
                        url = %url,
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts = max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        "Download failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Make a single request without retry.
    async fn fetch_once(&self, url: &str) -> WorkerResult<Vec<u8>> {
        debug!(url = %url, "GET request");

        let fetch_error = |e: reqwest::Error| WorkerError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_error)?;

        let bytes = response.bytes().await.map_err(fetch_error)?;
        if bytes.is_empty() {
            return Err(WorkerError::EmptyPayload {
                url: url.to_string(),
            });
        }

        Ok(bytes.to_vec())
    }
}
