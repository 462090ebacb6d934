//! Authenticated files.list requests with rate-limit retry.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::auth::TokenManager;
use crate::error::{DriveError, Result};
use crate::models::{ApiErrorResponse, FileListResponse, ListQuery};

/// Base URL for Google Drive API v3.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Error message prefix the API uses for per-user throttling.
pub const RATE_LIMIT_MARKER: &str = "User Rate Limit Exceeded";

/// How the executor reacts to rate-limit errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_retries: Option<u32>,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Some(8),
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Retry forever without delay.
    pub fn unbounded() -> Self {
        Self {
            max_retries: None,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Up to `max_retries` retries without delay.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries: Some(max_retries),
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before the given retry (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    fn allows(&self, retry: u32) -> bool {
        self.max_retries.map_or(true, |max| retry <= max)
    }
}

/// Issues single authenticated listing/search requests.
#[derive(Clone)]
pub struct QueryExecutor {
    http: Client,
    auth: TokenManager,
    api_base: String,
    retry: RetryPolicy,
}

impl QueryExecutor {
    pub fn new(
        http: Client,
        auth: TokenManager,
        api_base: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            auth,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn auth(&self) -> &TokenManager {
        &self.auth
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Run one files.list call, re-issuing it while the API reports throttling.
    #[instrument(skip(self, query), fields(q = %query.q))]
    pub async fn execute(&self, query: &ListQuery) -> Result<FileListResponse> {
        let mut retry = 0u32;

        loop {
            match self.send(query).await? {
                Attempt::Done(response) => return Ok(response),
                Attempt::RateLimited(message) => {
                    retry += 1;
                    if !self.retry.allows(retry) {
                        warn!(attempts = retry, "rate limit retries exhausted");
                        return Err(DriveError::RateLimited {
                            attempts: retry,
                            message,
                        });
                    }
                    let delay = self.retry.backoff(retry);
                    debug!(retry, delay_ms = delay.as_millis() as u64, "rate limited, retrying");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    async fn send(&self, query: &ListQuery) -> Result<Attempt> {
        // Checked on every attempt: a long resolution chain can cross the expiry.
        let token = self.auth.ensure_valid().await?;

        let response = self
            .http
            .get(format!("{}/files", self.api_base))
            .bearer_auth(&token)
            .query(&query.to_params())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&body) {
            let message = api_error.error.message;
            if message.starts_with(RATE_LIMIT_MARKER) {
                return Ok(Attempt::RateLimited(message));
            }
            return Err(DriveError::Request {
                status: api_error.error.code.unwrap_or(status.as_u16()),
                message,
            });
        }

        if !status.is_success() {
            return Err(DriveError::Request {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(Attempt::Done(serde_json::from_str(&body)?))
    }
}

enum Attempt {
    Done(FileListResponse),
    RateLimited(String),
}
