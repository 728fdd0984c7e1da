//! Access token retrieval.

use crate::error::ClientError;
use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use voice_types::{ErrorBody, TokenResponse};

/// Source of voice access tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn fetch(&self) -> Result<TokenResponse, ClientError>;
}

/// Fetches tokens from the gateway's `/api/token` endpoint.
#[derive(Clone)]
pub struct TokenClient {
    client: Client,
    base_url: String,
    session_token: Option<String>,
}

impl TokenClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: None,
        })
    }

    /// Send the sign-in session cookie with every request.
    pub fn with_session(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(session_token.into());
        self
    }

    #[instrument(skip(self))]
    pub async fn fetch_token(&self) -> Result<TokenResponse, ClientError> {
        let mut request = self.client.get(format!("{}/api/token", self.base_url));
        if let Some(token) = &self.session_token {
            request = request.header(header::COOKIE, format!("session_token={}", token));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .map(|e| e.error)
                .filter(|e| !e.is_empty());
            warn!(status = %status, reason = ?reason, "Token request failed");
            return Err(ClientError::Rejected(reason));
        }

        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        debug!(identity = %token.identity, region = %token.region, "Token received");
        Ok(token)
    }
}

#[async_trait]
impl CredentialSource for TokenClient {
    async fn fetch(&self) -> Result<TokenResponse, ClientError> {
        self.fetch_token().await
    }
}
