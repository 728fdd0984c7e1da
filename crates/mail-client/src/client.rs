//! Email HTTP client.

use crate::error::MailError;
use crate::types::*;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Transactional email API client.
///
/// The API key is stored using `SecretString` so it never shows up in
/// debug output.
#[derive(Clone)]
pub struct MailClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
    from: String,
}

impl MailClient {
    /// Create a new mail client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: SecretString::new(api_key.into()),
            from: from.into(),
        })
    }

    /// Sender address used for outgoing mail.
    pub fn from_address(&self) -> &str {
        &self.from
    }

    /// Send a sign-in link to `recipient`.
    #[instrument(skip(self, link))]
    pub async fn send_sign_in_link(
        &self,
        recipient: &str,
        link: &SignInLink,
    ) -> Result<Option<String>, MailError> {
        if !recipient.contains('@') {
            return Err(MailError::InvalidRecipient(recipient.to_string()));
        }

        let request = SendEmailRequest {
            from: self.from.clone(),
            to: vec![recipient.to_string()],
            subject: link.subject(),
            html: link.html(),
            text: link.text(),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Email send failed: {}", body);
            return Err(MailError::SendFailed(format!("{} - {}", status, body)));
        }

        let sent: SendEmailResponse = response.json().await?;
        debug!(email_id = ?sent.id, "Sent sign-in link");
        Ok(sent.id)
    }
}
