//! Client for the `refresh_token` grant.

use reqwest::Client;

use crate::endpoint::TokenEndpoint;
use crate::error::Result;
use crate::token::{RefreshErrorResponse, RefreshResponse};

/// Exchanges a refresh token for a new access token.
#[derive(Debug, Clone)]
pub struct RefreshClient {
    client_id: String,
    client_secret: Option<String>,
    endpoint: TokenEndpoint,
    http_client: Client,
}

impl RefreshClient {
    /// Creates a client for `client_id` at `endpoint`.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        endpoint: TokenEndpoint,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            endpoint,
            http_client: Client::new(),
        }
    }

    /// Posts a `refresh_token` grant.
    ///
    /// # Errors
    ///
    /// Returns `Error::Rejected` if the endpoint refuses the grant, or an HTTP
    /// or JSON error.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http_client
            .post(self.endpoint.url().clone())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error: RefreshErrorResponse = response.json().await?;
            return Err(error.into());
        }

        let refreshed: RefreshResponse = response.json().await?;
        tracing::info!(endpoint = %self.endpoint.url(), "Access token refreshed");
        Ok(refreshed)
    }
}
