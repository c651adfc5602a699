//! Access tokens and token endpoint responses.

mod credentials;

pub use credentials::AuthorizedUser;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::Error;

/// Tokens expiring within this window are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A bearer token for the Gmail API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer value sent in `Authorization`.
    pub value: String,
    /// Expiration time, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Returns true if the token is missing or expires within a minute of `now`.
    ///
    /// A token without a known expiry is trusted until the API rejects it.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.value.is_empty()
            || self
                .expires_at
                .is_some_and(|exp| now + Duration::seconds(EXPIRY_MARGIN_SECS) >= exp)
    }

    /// [`AccessToken::is_expired_at`] against the current time.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Successful response to a `refresh_token` grant.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    /// New access token.
    pub access_token: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Replacement refresh token. Google only sends one when it rotates.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Space separated granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

impl RefreshResponse {
    /// The access token this response grants, issued at `issued_at`.
    #[must_use]
    pub fn access_token(&self, issued_at: DateTime<Utc>) -> AccessToken {
        AccessToken {
            value: self.access_token.clone(),
            expires_at: self
                .expires_in
                .map(|secs| issued_at + Duration::seconds(secs)),
        }
    }
}

/// Error body returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshErrorResponse {
    /// Error code.
    pub error: String,
    /// Error description.
    #[serde(default)]
    pub error_description: String,
}

impl From<RefreshErrorResponse> for Error {
    fn from(response: RefreshErrorResponse) -> Self {
        Self::Rejected {
            error: response.error,
            description: response.error_description,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 16, 0, 0).unwrap()
    }

    fn token(expires_at: Option<DateTime<Utc>>) -> AccessToken {
        AccessToken {
            value: "ya29.a0Af".to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_expiry_margin() {
        assert!(token(Some(now() - Duration::seconds(120))).is_expired_at(now()));
        assert!(token(Some(now() + Duration::seconds(30))).is_expired_at(now()));
        assert!(!token(Some(now() + Duration::seconds(3600))).is_expired_at(now()));
    }

    #[test]
    fn test_unknown_expiry_is_trusted() {
        assert!(!token(None).is_expired_at(now()));
    }

    #[test]
    fn test_empty_value_is_expired() {
        let empty = AccessToken {
            value: String::new(),
            expires_at: None,
        };
        assert!(empty.is_expired_at(now()));
    }

    #[test]
    fn test_refresh_response_lifetime() {
        let response: RefreshResponse = serde_json::from_str(
            r#"{"access_token": "ya29.new", "expires_in": 3599, "token_type": "Bearer"}"#,
        )
        .unwrap();
        assert!(response.refresh_token.is_none());

        let token = response.access_token(now());
        assert_eq!(token.value, "ya29.new");
        assert_eq!(token.expires_at, Some(now() + Duration::seconds(3599)));
    }

    #[test]
    fn test_error_response_into_error() {
        let response: RefreshErrorResponse = serde_json::from_str(
            r#"{"error": "invalid_grant", "error_description": "Token has been expired or revoked."}"#,
        )
        .unwrap();
        let err = Error::from(response);
        assert!(matches!(err, Error::Rejected { ref error, .. } if error == "invalid_grant"));
    }
}
