//! Passwordless email sign-in.
//!
//! A sign-in link carries a random token; only its salted hash is stored.
//! Following the link consumes the token, consults the [`AccessGate`] and
//! either establishes a session or silently declines.

pub mod cookie;

use crate::access::AccessGate;
use crate::config::Config;
use crate::error::GatewayError;
use chrono::{DateTime, Utc};
use identity_store::{random_hex, IdentityStore, LinkedAccount, Session, User, VerificationToken};
use mail_client::{MailClient, SignInLink};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{info, instrument, warn};
use validator::ValidateEmail;

/// Provider name recorded on linked accounts.
pub const EMAIL_PROVIDER: &str = "email";

const TOKEN_BYTES: usize = 32;

/// Result of following a sign-in link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    Established(Session),
    /// Address verified but not on the allow-lists
    Denied,
}

/// Sign-in service.
pub struct SignIn {
    store: IdentityStore,
    mail: Option<MailClient>,
    gate: AccessGate,
    base_url: String,
    secret: SecretString,
    session_max_age: Duration,
    verification_max_age: Duration,
}

impl SignIn {
    pub fn new(
        store: IdentityStore,
        mail: Option<MailClient>,
        gate: AccessGate,
        base_url: impl Into<String>,
        secret: SecretString,
    ) -> Self {
        let defaults = crate::config::AuthConfig::default();
        Self {
            store,
            mail,
            gate,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret,
            session_max_age: defaults.session_max_age,
            verification_max_age: defaults.verification_max_age,
        }
    }

    /// Build from configuration. A missing auth secret is replaced by a
    /// random one, which invalidates outstanding links on restart.
    pub fn from_config(config: &Config, store: IdentityStore, mail: Option<MailClient>) -> Self {
        let secret = config.auth.secret.clone().unwrap_or_else(|| {
            warn!("AUTH__SECRET not set, using a random secret for this process");
            SecretString::new(random_hex(32))
        });

        Self::new(
            store,
            mail,
            AccessGate::from_config(&config.access),
            config.auth.base_url.clone(),
            secret,
        )
        .with_max_ages(config.auth.session_max_age, config.auth.verification_max_age)
    }

    pub fn with_max_ages(mut self, session: Duration, verification: Duration) -> Self {
        self.session_max_age = session;
        self.verification_max_age = verification;
        self
    }

    pub fn store(&self) -> &IdentityStore {
        &self.store
    }

    pub fn session_max_age(&self) -> Duration {
        self.session_max_age
    }

    /// Whether session cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Store a fresh verification token for `email` and return the raw token.
    pub async fn create_verification(&self, email: &str) -> Result<String, GatewayError> {
        let email = validate_email(email)?;
        let token = random_hex(TOKEN_BYTES);

        self.store
            .create_verification_token(VerificationToken {
                identifier: email,
                token_hash: hash_token(&token, &self.secret),
                expires: expires_after(self.verification_max_age),
            })
            .await?;

        Ok(token)
    }

    /// Callback URL embedding `token` for `email`.
    pub fn callback_url(&self, email: &str, token: &str) -> String {
        format!(
            "{}/auth/callback?token={}&email={}",
            self.base_url,
            urlencoding::encode(token),
            urlencoding::encode(email)
        )
    }

    /// Email a sign-in link. Sent regardless of the allow-lists.
    #[instrument(skip(self))]
    pub async fn send_link(&self, email: &str) -> Result<(), GatewayError> {
        let Some(mail) = &self.mail else {
            return Err(GatewayError::Config("missing EMAIL__API_KEY".into()));
        };

        let email = validate_email(email)?;
        let token = self.create_verification(&email).await?;

        let link = SignInLink {
            host: host_of(&self.base_url).to_string(),
            url: self.callback_url(&email, &token),
        };
        let id = mail.send_sign_in_link(&email, &link).await?;

        info!(email = %email, message_id = ?id, "Sign-in link sent");
        Ok(())
    }

    /// Consume a sign-in link and establish a session if the address is allowed.
    #[instrument(skip(self, token))]
    pub async fn complete(&self, email: &str, token: &str) -> Result<SignInOutcome, GatewayError> {
        let email = normalize_email(email);
        let token_hash = hash_token(token, &self.secret);

        if self
            .store
            .use_verification_token(&email, &token_hash)
            .await?
            .is_none()
        {
            warn!(email = %email, "Invalid or expired sign-in link");
            return Err(GatewayError::InvalidLink);
        }

        if !self.gate.allows(&email) {
            return Ok(SignInOutcome::Denied);
        }

        let user = self.store.upsert_verified_user(&email).await?;
        self.store
            .link_account(LinkedAccount {
                user_id: user.id.clone(),
                kind: EMAIL_PROVIDER.to_string(),
                provider: EMAIL_PROVIDER.to_string(),
                provider_account_id: email.clone(),
            })
            .await?;

        let expires = expires_after(self.session_max_age);
        let session = self.store.create_session(&user.id, expires).await?;

        info!(user_id = %user.id, "Session established");
        Ok(SignInOutcome::Established(session))
    }

    /// Live session and user for a session token.
    pub async fn current_session(&self, session_token: &str) -> Option<(Session, User)> {
        self.store.get_session_and_user(session_token).await
    }

    /// End a session. Returns whether it existed.
    pub async fn sign_out(&self, session_token: &str) -> Result<bool, GatewayError> {
        Ok(self.store.delete_session(session_token).await?)
    }
}

/// Hex sha256 of the token followed by the secret.
pub fn hash_token(token: &str, secret: &SecretString) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.update(secret.expose_secret().as_bytes());
    hex::encode(hasher.finalize())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize and check the address shape.
fn validate_email(email: &str) -> Result<String, GatewayError> {
    let email = normalize_email(email);
    if email.validate_email() {
        Ok(email)
    } else {
        Err(GatewayError::InvalidEmail(email))
    }
}

fn host_of(base_url: &str) -> &str {
    let rest = base_url
        .split_once("://")
        .map_or(base_url, |(_, rest)| rest);
    rest.split('/').next().unwrap_or(rest)
}

/// `now + after`, clamped to a century for out-of-range lifetimes.
fn expires_after(after: Duration) -> DateTime<Utc> {
    let now = Utc::now();
    chrono::Duration::from_std(after)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or_else(|| now + chrono::Duration::days(36_500))
}
