//! Voice credential issuance.

mod jwt;

pub use jwt::{
    AccessToken, AccessTokenClaims, Grants, IncomingGrant, OutgoingGrant, VoiceGrant,
    TOKEN_CONTENT_TYPE,
};

use crate::config::TwilioConfig;
use crate::error::GatewayError;
use rand::{distributions::Alphanumeric, Rng};
use secrecy::ExposeSecret;
use tracing::{debug, error};
use voice_types::{Region, TokenResponse};

/// Prefix of every generated identity.
pub const IDENTITY_PREFIX: &str = "user_";

const IDENTITY_SUFFIX_LEN: usize = 10;

/// Freshly issued credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub identity: String,
    pub region: Region,
}

impl From<Credential> for TokenResponse {
    fn from(c: Credential) -> Self {
        TokenResponse {
            token: c.token,
            identity: c.identity,
            region: c.region,
        }
    }
}

/// Mints voice access tokens from server configuration.
///
/// Holds no mutable state; every call is independent.
#[derive(Debug, Clone)]
pub struct CredentialIssuer {
    config: TwilioConfig,
}

/// The four values issuance cannot proceed without.
struct Required<'a> {
    account_sid: &'a str,
    api_key: &'a str,
    api_secret: &'a str,
    app_sid: &'a str,
}

impl CredentialIssuer {
    pub fn new(config: TwilioConfig) -> Self {
        Self { config }
    }

    /// Issue a credential for a new random identity.
    pub fn issue(&self) -> Result<Credential, GatewayError> {
        let required = self.required()?;
        let region = self.region()?;
        let identity = generate_identity();

        let token = AccessToken {
            account_sid: required.account_sid,
            api_key: required.api_key,
            identity: &identity,
            region: region.as_ref().map(Region::code),
            ttl_secs: self.config.token_ttl.as_secs() as i64,
            grant: VoiceGrant::bidirectional(required.app_sid),
        }
        .to_jwt(required.api_secret, chrono::Utc::now().timestamp())?;

        let region = region.unwrap_or_default();
        debug!(identity = %identity, region = %region, "Issued access token");

        Ok(Credential {
            token,
            identity,
            region,
        })
    }

    fn required(&self) -> Result<Required<'_>, GatewayError> {
        let account_sid = present(self.config.account_sid.as_deref());
        let api_key = present(self.config.api_key.as_deref());
        let api_secret = present(
            self.config
                .api_secret
                .as_ref()
                .map(|s| s.expose_secret().as_str()),
        );
        let app_sid = present(self.config.twiml_app_sid.as_deref());

        match (account_sid, api_key, api_secret, app_sid) {
            (Some(account_sid), Some(api_key), Some(api_secret), Some(app_sid)) => Ok(Required {
                account_sid,
                api_key,
                api_secret,
                app_sid,
            }),
            _ => {
                let missing: Vec<&str> = [
                    ("TWILIO__ACCOUNT_SID", account_sid.is_none()),
                    ("TWILIO__API_KEY", api_key.is_none()),
                    ("TWILIO__API_SECRET", api_secret.is_none()),
                    ("TWILIO__TWIML_APP_SID", app_sid.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();

                error!(missing = ?missing, "Cannot issue access token");
                Err(GatewayError::Config(format!(
                    "missing {}",
                    missing.join(", ")
                )))
            }
        }
    }

    /// Configured region, `None` when unset.
    fn region(&self) -> Result<Option<Region>, GatewayError> {
        match self.config.region.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(code) => code
                .parse::<Region>()
                .map(Some)
                .map_err(|e| GatewayError::Config(e.to_string())),
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Random endpoint identity, e.g. `user_k3v9x0q2ab`.
pub fn generate_identity() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(IDENTITY_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}{}", IDENTITY_PREFIX, suffix)
}
