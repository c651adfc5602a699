//! Error types for credential refresh.

use std::path::PathBuf;

/// Result type alias for credential operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading, refreshing or saving credentials.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading or writing the credential file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The token endpoint could not be reached.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The credential file or a token endpoint response is malformed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The token endpoint refused the refresh (revoked or expired grant).
    #[error("Refresh rejected: {error} - {description}")]
    Rejected {
        /// Error code (e.g., `invalid_grant`).
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// The access token expired and there is no refresh token to renew it.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// No credential file exists yet.
    #[error("No credentials found at {}", .0.display())]
    MissingCredentials(PathBuf),

    /// `token_uri` is not an http(s) URL.
    #[error("Invalid token_uri {uri}: {reason}")]
    InvalidTokenUri {
        /// The configured value.
        uri: String,
        /// Why it was rejected.
        reason: String,
    },
}
