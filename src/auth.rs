//! OAuth2 refresh-token authentication for Google APIs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{DriveError, Result};
use crate::models::{TokenErrorResponse, TokenResponse};

/// Google OAuth2 token endpoint.
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Subtracted from the declared token lifetime to absorb clock skew.
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// Long-lived client credentials used to mint access tokens.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Cached access token with expiration.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Keeps an access token valid, refreshing it only when absent or expired.
///
/// Cloning is cheap and clones share the token state, so every component of a
/// session sees the same token.
#[derive(Clone)]
pub struct TokenManager {
    credentials: Arc<Credentials>,
    token_uri: String,
    client: Client,
    cached_token: Arc<Mutex<Option<CachedToken>>>,
}

impl TokenManager {
    pub fn new(credentials: Credentials, client: Client) -> Self {
        Self::with_token_uri(credentials, client, TOKEN_URI)
    }

    pub fn with_token_uri(
        credentials: Credentials,
        client: Client,
        token_uri: impl Into<String>,
    ) -> Self {
        Self {
            credentials: Arc::new(credentials),
            token_uri: token_uri.into(),
            client,
            cached_token: Arc::new(Mutex::new(None)),
        }
    }

    /// Make sure the held access token is unexpired and return it.
    ///
    /// The lock is held across the exchange so concurrent callers that find
    /// the token expired wait for a single refresh instead of each starting one.
    pub async fn ensure_valid(&self) -> Result<String> {
        let mut cached = self.cached_token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_valid() {
                return Ok(token.access_token.clone());
            }
            debug!("access token expired");
        }

        let new_token = self.refresh_token().await?;
        let access_token = new_token.access_token.clone();
        *cached = Some(new_token);
        Ok(access_token)
    }

    /// Exchange the refresh token for a fresh access token.
    #[instrument(skip(self), fields(client_id = %self.credentials.client_id))]
    async fn refresh_token(&self) -> Result<CachedToken> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if let Ok(err) = serde_json::from_str::<TokenErrorResponse>(&body) {
            warn!(status = status.as_u16(), error = %err.error, "token exchange rejected");
            return Err(DriveError::Authorization {
                status: status.as_u16(),
                message: err.error_description.unwrap_or(err.error),
            });
        }

        if !status.is_success() {
            return Err(DriveError::Authorization {
                status: status.as_u16(),
                message: body,
            });
        }

        let token_response: TokenResponse = serde_json::from_str(&body)?;
        let lifetime =
            Duration::from_secs(token_response.expires_in).saturating_sub(EXPIRY_MARGIN);
        let expires_at = Instant::now().checked_add(lifetime).ok_or_else(|| {
            DriveError::Authorization {
                status: status.as_u16(),
                message: format!("unusable expires_in: {}", token_response.expires_in),
            }
        })?;
        info!(expires_in = token_response.expires_in, "access token refreshed");

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_token_validity() {
        let fresh = CachedToken {
            access_token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(60),
        };
        assert!(fresh.is_valid());

        let stale = CachedToken {
            access_token: "t".to_string(),
            expires_at: Instant::now(),
        };
        assert!(!stale.is_valid());
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let creds = Credentials {
            client_id: "id.apps.googleusercontent.com".to_string(),
            client_secret: "shh".to_string(),
            refresh_token: "1//refresh".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("id.apps.googleusercontent.com"));
        assert!(!debug.contains("shh"));
        assert!(!debug.contains("1//refresh"));
    }
}
