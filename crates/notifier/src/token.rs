//! Identity token acquisition.
//!
//! Tokens are fetched once per invocation and never retried: a failure here is
//! terminal and happens before the delivery engine runs.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::{NotifyError, Result};

/// Environment variable holding the CI token endpoint
pub const REQUEST_URL_VAR: &str = "ACTIONS_ID_TOKEN_REQUEST_URL";
/// Environment variable holding the credential for the token endpoint
pub const REQUEST_TOKEN_VAR: &str = "ACTIONS_ID_TOKEN_REQUEST_TOKEN";

/// Source of bearer tokens scoped to an audience
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch(&self, audience: &str) -> Result<String>;
}

/// A token issued out of band
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticToken")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn fetch(&self, _audience: &str) -> Result<String> {
        if self.token.trim().is_empty() {
            return Err(NotifyError::token("static token is empty"));
        }
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct IdTokenResponse {
    value: Option<String>,
}

/// Exchanges the CI runner's request credential for an OIDC identity token.
#[derive(Clone)]
pub struct ActionsIdTokenProvider {
    client: reqwest::Client,
    request_url: String,
    request_token: String,
}

impl ActionsIdTokenProvider {
    pub fn new(
        client: reqwest::Client,
        request_url: impl Into<String>,
        request_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            request_url: request_url.into(),
            request_token: request_token.into(),
        }
    }

    /// Create from the runner environment
    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let request_url = std::env::var(REQUEST_URL_VAR)
            .map_err(|_| NotifyError::token(format!("Unable to get {REQUEST_URL_VAR} env variable")))?;
        let request_token = std::env::var(REQUEST_TOKEN_VAR).map_err(|_| {
            NotifyError::token(format!("Unable to get {REQUEST_TOKEN_VAR} env variable"))
        })?;

        Ok(Self::new(client, request_url, request_token))
    }

    fn token_url(&self, audience: &str) -> Result<Url> {
        let mut url = Url::parse(&self.request_url)
            .map_err(|e| NotifyError::token(format!("invalid token request URL: {e}")))?;
        url.query_pairs_mut().append_pair("audience", audience);
        Ok(url)
    }
}

impl fmt::Debug for ActionsIdTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionsIdTokenProvider")
            .field("request_url", &self.request_url)
            .field("request_token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for ActionsIdTokenProvider {
    async fn fetch(&self, audience: &str) -> Result<String> {
        let url = self.token_url(audience)?;
        tracing::debug!(audience, "Requesting identity token");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.request_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| NotifyError::token(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::token(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: IdTokenResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::token(format!("invalid token response: {e}")))?;

        match parsed.value {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(NotifyError::token("token response did not contain a value")),
        }
    }
}
