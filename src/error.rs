//! Error types for the drive_index crate.

use thiserror::Error;

/// Errors that can occur when resolving or reading from the drive.
#[derive(Error, Debug)]
pub enum DriveError {
    /// The token endpoint rejected the refresh-token exchange.
    #[error("Authorization failed ({status}): {message}")]
    Authorization { status: u16, message: String },

    /// The path does not resolve to any remote object.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The listing endpoint answered with a non rate-limit error.
    #[error("API error ({status}): {message}")]
    Request { status: u16, message: String },

    /// The media endpoint answered with a non-success status.
    #[error("Range read failed ({status}): {message}")]
    RangeRead { status: u16, message: String },

    /// Still rate limited after the retry budget was spent.
    #[error("Rate limited after {attempts} attempts: {message}")]
    RateLimited { attempts: u32, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DriveError {
    /// HTTP-like status code for the error, when one applies.
    pub fn status(&self) -> Option<u16> {
        match self {
            DriveError::Authorization { status, .. }
            | DriveError::Request { status, .. }
            | DriveError::RangeRead { status, .. } => Some(*status),
            DriveError::NotFound(_) => Some(404),
            DriveError::RateLimited { .. } => Some(429),
            DriveError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DriveError::NotFound("/a/".into()).status(), Some(404));
        let err = DriveError::Request {
            status: 400,
            message: "Invalid Value".into(),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(DriveError::Config("x".into()).status(), None);
    }
}
