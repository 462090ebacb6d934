//! Session configuration loaded from a JSON file.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::auth::{Credentials, TOKEN_URI};
use crate::error::{DriveError, Result};
use crate::listing::MAX_PAGE_SIZE;
use crate::query::{RetryPolicy, DRIVE_API_BASE};

/// Configuration for a [`DriveIndex`](crate::DriveIndex) session.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,

    /// Folder id, or a Drive folder URL, used as `/`.
    #[serde(default = "default_root")]
    pub root: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Rate-limit retry settings; `max_retries: null` retries forever.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: Option<u32>,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

fn default_root() -> String {
    "root".to_string()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_api_base() -> String {
    DRIVE_API_BASE.to_string()
}

fn default_token_uri() -> String {
    TOKEN_URI.to_string()
}

fn default_max_retries() -> Option<u32> {
    RetryPolicy::default().max_retries
}

fn default_initial_backoff_ms() -> u64 {
    RetryPolicy::default().initial_backoff.as_millis() as u64
}

fn default_max_backoff_ms() -> u64 {
    RetryPolicy::default().max_backoff.as_millis() as u64
}

impl DriveConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Reject configurations that cannot produce a working session.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
            ("root", &self.root),
        ] {
            if value.trim().is_empty() {
                return Err(DriveError::Config(format!("{} must not be empty", field)));
            }
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(DriveError::Config(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    /// The root folder id, extracted from a URL when `root` is one.
    pub fn root_id(&self) -> Result<String> {
        folder_id(&self.root)
    }
}

static FOLDER_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/drive/(?:u/\d+/)?folders/([a-zA-Z0-9_-]+)")
        .expect("Invalid folder URL regex")
});

static OPEN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/open\?(?:.*&)?id=([a-zA-Z0-9_-]+)")
        .expect("Invalid open URL regex")
});

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid ID regex"));

/// Extract a folder id from a Drive folder URL, or accept a bare id.
///
/// Supported formats:
/// - `https://drive.google.com/drive/folders/{id}`
/// - `https://drive.google.com/drive/u/{n}/folders/{id}`
/// - `https://drive.google.com/open?id={id}`
/// - `{id}` (including the `root` alias)
pub fn folder_id(input: &str) -> Result<String> {
    let input = input.trim();

    for re in [&*FOLDER_URL, &*OPEN_URL] {
        if let Some(caps) = re.captures(input) {
            return Ok(caps[1].to_string());
        }
    }
    if BARE_ID.is_match(input) {
        return Ok(input.to_string());
    }

    Err(DriveError::Config(format!("invalid root folder: {}", input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_id_from_url() {
        assert_eq!(
            folder_id("https://drive.google.com/drive/folders/1abcXYZ-_9").unwrap(),
            "1abcXYZ-_9"
        );
        assert_eq!(
            folder_id("https://drive.google.com/drive/u/1/folders/1abc?usp=sharing").unwrap(),
            "1abc"
        );
        assert_eq!(
            folder_id("https://drive.google.com/open?id=0AAfolder").unwrap(),
            "0AAfolder"
        );
    }

    #[test]
    fn test_folder_id_bare() {
        assert_eq!(folder_id("root").unwrap(), "root");
        assert_eq!(folder_id("  0AAfolder ").unwrap(), "0AAfolder");
        assert!(folder_id("not a folder").is_err());
        assert!(folder_id("https://example.com/folders/x").is_err());
    }

    #[test]
    fn test_defaults() {
        let config: DriveConfig = serde_json::from_str(
            r#"{"client_id": "id", "client_secret": "secret", "refresh_token": "rt"}"#,
        )
        .unwrap();
        assert_eq!(config.root, "root");
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.api_base, DRIVE_API_BASE);
        assert_eq!(config.rate_limit.policy(), RetryPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unbounded_rate_limit() {
        let config: DriveConfig = serde_json::from_str(
            r#"{"client_id": "id", "client_secret": "secret", "refresh_token": "rt",
                "rate_limit": {"max_retries": null, "initial_backoff_ms": 0}}"#,
        )
        .unwrap();
        let policy = config.rate_limit.policy();
        assert_eq!(policy.max_retries, None);
        assert_eq!(policy.initial_backoff, Duration::ZERO);
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let config: DriveConfig = serde_json::from_str(
            r#"{"client_id": "id", "client_secret": " ", "refresh_token": "rt"}"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("client_secret"));
    }
}
