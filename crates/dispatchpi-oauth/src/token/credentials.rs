//! Stored credentials in Google's authorized-user JSON layout.
//!
//! This is the `token.json` format written by Google's client libraries, so a
//! file produced by any of them can be used as-is:
//!
//! ```json
//! {
//!   "token": "ya29...", "refresh_token": "1//0g...",
//!   "token_uri": "https://oauth2.googleapis.com/token",
//!   "client_id": "...apps.googleusercontent.com", "client_secret": "...",
//!   "scopes": ["https://www.googleapis.com/auth/gmail.readonly"],
//!   "expiry": "2024-05-10T16:35:02.123456Z"
//! }
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccessToken, RefreshResponse};
use crate::client::RefreshClient;
use crate::endpoint::{GOOGLE_TOKEN_URI, TokenEndpoint};
use crate::error::{Error, Result};

/// Credentials of the user whose inbox feeds the frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    /// Current access token.
    #[serde(default)]
    pub token: String,
    /// Long-lived refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token endpoint used for refreshing.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access token expiry.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    /// Fields written by other tools, kept on save.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl AuthorizedUser {
    /// Loads credentials from `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingCredentials` if the file does not exist, or an
    /// I/O or JSON error.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingCredentials(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    /// Writes credentials to `path`, creating the parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        tracing::debug!(path = %path.display(), "Credentials saved");
        Ok(())
    }

    /// The stored access token.
    #[must_use]
    pub fn access_token(&self) -> AccessToken {
        AccessToken {
            value: self.token.clone(),
            expires_at: self.expiry,
        }
    }

    fn client(&self) -> Result<RefreshClient> {
        let endpoint = TokenEndpoint::parse(&self.token_uri)?;
        Ok(RefreshClient::new(
            &self.client_id,
            self.client_secret.clone(),
            endpoint,
        ))
    }

    /// Stores the result of a refresh made at `issued_at`.
    ///
    /// The refresh token and scopes are only replaced when the response carries them.
    pub fn apply(&mut self, response: RefreshResponse, issued_at: DateTime<Utc>) {
        let token = response.access_token(issued_at);
        self.token = token.value;
        self.expiry = token.expires_at;
        if response.refresh_token.is_some() {
            self.refresh_token = response.refresh_token;
        }
        if let Some(scope) = response.scope {
            self.scopes = scope.split_whitespace().map(ToString::to_string).collect();
        }
    }

    /// Refreshes the access token if it is expired.
    ///
    /// Returns true if a new token was obtained; the caller should save.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoRefreshToken` if the token expired and cannot be
    /// renewed, `Error::InvalidTokenUri` for a bad endpoint, or the refresh error.
    pub async fn ensure_fresh(&mut self) -> Result<bool> {
        if !self.access_token().is_expired() {
            return Ok(false);
        }
        let refresh_token = self.refresh_token.as_deref().ok_or(Error::NoRefreshToken)?;
        let issued_at = Utc::now();
        let response = self.client()?.refresh(refresh_token).await?;
        self.apply(response, issued_at);
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    const GOOGLE_FILE: &str = r#"{
        "token": "ya29.a0Af",
        "refresh_token": "1//0gRefresh",
        "token_uri": "https://oauth2.googleapis.com/token",
        "client_id": "123.apps.googleusercontent.com",
        "client_secret": "GOCSPX-secret",
        "scopes": ["https://www.googleapis.com/auth/gmail.readonly"],
        "universe_domain": "googleapis.com",
        "account": "",
        "expiry": "2024-05-10T16:35:02.123456Z"
    }"#;

    fn user() -> AuthorizedUser {
        serde_json::from_str(GOOGLE_FILE).unwrap()
    }

    #[test]
    fn test_parse_google_layout() {
        let user = user();
        assert_eq!(user.token, "ya29.a0Af");
        assert_eq!(user.refresh_token.as_deref(), Some("1//0gRefresh"));
        assert_eq!(user.scopes.len(), 1);
        assert_eq!(user.extra["universe_domain"], "googleapis.com");
        assert!(user.access_token().is_expired());
    }

    #[test]
    fn test_token_uri_defaults_to_google() {
        let user: AuthorizedUser =
            serde_json::from_str(r#"{"client_id": "123", "refresh_token": "r"}"#).unwrap();
        assert_eq!(user.token_uri, GOOGLE_TOKEN_URI);
        assert!(user.client().is_ok());
    }

    #[test]
    fn test_apply_keeps_refresh_token_and_scopes() {
        let mut user = user();
        let issued_at = Utc::now();
        let response: RefreshResponse =
            serde_json::from_str(r#"{"access_token": "ya29.new", "expires_in": 3600}"#).unwrap();
        user.apply(response, issued_at);

        assert_eq!(user.token, "ya29.new");
        assert_eq!(user.expiry, Some(issued_at + Duration::seconds(3600)));
        assert_eq!(user.refresh_token.as_deref(), Some("1//0gRefresh"));
        assert_eq!(user.scopes.len(), 1);
        assert!(!user.access_token().is_expired());
    }

    #[test]
    fn test_apply_takes_rotated_refresh_token() {
        let mut user = user();
        let response: RefreshResponse = serde_json::from_str(
            r#"{"access_token": "ya29.new", "refresh_token": "1//0gRotated", "scope": "a b"}"#,
        )
        .unwrap();
        user.apply(response, Utc::now());

        assert_eq!(user.refresh_token.as_deref(), Some("1//0gRotated"));
        assert_eq!(user.scopes, ["a", "b"]);
        assert_eq!(user.expiry, None);
    }

    #[tokio::test]
    async fn test_ensure_fresh_skips_valid_token() {
        let mut user = user();
        user.expiry = Some(Utc::now() + Duration::seconds(3600));
        assert!(!user.ensure_fresh().await.unwrap());
        assert_eq!(user.token, "ya29.a0Af");
    }

    #[tokio::test]
    async fn test_ensure_fresh_without_refresh_token() {
        let mut user = user();
        user.refresh_token = None;
        let err = user.ensure_fresh().await.unwrap_err();
        assert!(matches!(err, Error::NoRefreshToken));
    }

    #[tokio::test]
    async fn test_ensure_fresh_rejects_bad_token_uri() {
        let mut user = user();
        user.token_uri = "file:///etc/token".to_string();
        let err = user.ensure_fresh().await.unwrap_err();
        assert!(matches!(err, Error::InvalidTokenUri { .. }));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets").join("token.json");
        let user = user();

        user.save(&path).await.unwrap();
        let loaded = AuthorizedUser::load(&path).await.unwrap();
        assert_eq!(loaded.token, user.token);
        assert_eq!(loaded.expiry, user.expiry);
        assert_eq!(loaded.extra, user.extra);
    }

    #[tokio::test]
    async fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let err = AuthorizedUser::load(&path).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentials(ref p) if *p == path));
    }
}
