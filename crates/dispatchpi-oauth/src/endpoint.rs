//! Token endpoint of the authorization server.

use url::Url;

use crate::error::{Error, Result};

/// Google's token endpoint, used when a credential file names none.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// A validated http(s) token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEndpoint(Url);

impl TokenEndpoint {
    /// Parses and checks a `token_uri` value.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTokenUri` if the value is not an http(s) URL.
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidTokenUri {
            uri: uri.to_string(),
            reason,
        };
        let url = Url::parse(uri).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "https" | "http") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        Ok(Self(url))
    }

    /// The endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.0
    }
}
