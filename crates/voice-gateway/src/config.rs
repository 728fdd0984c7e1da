//! Configuration for the voice gateway.

use crate::access::UnrestrictedPolicy;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Telephony platform credentials and call settings
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// Sign-in allow-lists
    #[serde(default)]
    pub access: AccessConfig,

    /// Email delivery for sign-in links
    #[serde(default)]
    pub email: EmailConfig,

    /// Session and verification settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Identity store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Telephony settings. The four identifiers are only checked when a token
/// is requested, so the gateway starts without them.
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    /// Account SID
    #[serde(default)]
    pub account_sid: Option<String>,

    /// API key SID
    #[serde(default)]
    pub api_key: Option<String>,

    /// API key secret
    #[serde(default)]
    pub api_secret: Option<SecretString>,

    /// Application SID outgoing calls are routed through
    #[serde(default)]
    pub twiml_app_sid: Option<String>,

    /// Region code (e.g. "ie1"); unset means us1
    #[serde(default)]
    pub region: Option<String>,

    /// Caller id for calls bridged to phone numbers
    #[serde(default)]
    pub phone_number: String,

    /// Access token lifetime
    #[serde(default = "default_token_ttl", with = "humantime_serde")]
    pub token_ttl: Duration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessConfig {
    /// Comma-separated allowed email addresses
    #[serde(default)]
    pub allowed_emails: String,

    /// Comma-separated allowed domains
    #[serde(default)]
    pub allowed_domains: String,

    /// Decision when both lists are empty
    #[serde(default)]
    pub when_unrestricted: UnrestrictedPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Sender address for sign-in links
    #[serde(default = "default_email_from")]
    pub from: String,

    /// Email API key
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Email API base URL
    #[serde(default = "default_email_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Public base URL used to build sign-in links
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Secret mixed into verification token hashes
    #[serde(default)]
    pub secret: Option<SecretString>,

    /// Session lifetime
    #[serde(default = "default_session_max_age", with = "humantime_serde")]
    pub session_max_age: Duration,

    /// Sign-in link lifetime
    #[serde(default = "default_verification_max_age", with = "humantime_serde")]
    pub verification_max_age: Duration,

    /// Require a signed-in session to obtain access tokens
    #[serde(default = "default_true")]
    pub protect_token: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store URL: `memory:` or `file:<path>`
    #[serde(default = "default_store_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            api_key: None,
            api_secret: None,
            twiml_app_sid: None,
            region: None,
            phone_number: String::new(),
            token_ttl: default_token_ttl(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from: default_email_from(),
            api_key: None,
            api_url: default_email_api_url(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            secret: None,
            session_max_age: default_session_max_age(),
            verification_max_age: default_verification_max_age(),
            protect_token: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Socket address to bind. A malformed listen address is an error.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .listen_addr
            .trim()
            .parse()
            .with_context(|| format!("Invalid SERVER__LISTEN_ADDR {:?}", self.listen_addr))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_token_ttl() -> Duration {
    Duration::from_secs(3600)
}

fn default_email_from() -> String {
    "noreply@yourdomain.com".into()
}

fn default_email_api_url() -> String {
    "https://api.resend.com".into()
}

fn default_base_url() -> String {
    "http://localhost:3000".into()
}

fn default_session_max_age() -> Duration {
    Duration::from_secs(30 * 24 * 60 * 60)
}

fn default_verification_max_age() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_true() -> bool {
    true
}

fn default_store_url() -> String {
    "memory:".into()
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_global_rpm() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.twilio.token_ttl, Duration::from_secs(3600));
        assert!(config.twilio.region.is_none());
        assert!(config.twilio.phone_number.is_empty());
        assert_eq!(config.email.from, "noreply@yourdomain.com");
        assert_eq!(config.store.url, "memory:");
        assert_eq!(config.server.port, 3000);
        assert!(config.auth.protect_token);
        assert_eq!(
            config.access.when_unrestricted,
            UnrestrictedPolicy::AllowAll
        );
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.socket_addr().unwrap().to_string(), "0.0.0.0:3000");

        let server = ServerConfig {
            listen_addr: "127.0.0.1".into(),
            port: 8080,
        };
        assert_eq!(server.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_socket_addr_rejects_typo() {
        let server = ServerConfig {
            listen_addr: "127.0.0.l".into(),
            ..ServerConfig::default()
        };
        let err = server.socket_addr().unwrap_err();
        assert!(err.to_string().contains("SERVER__LISTEN_ADDR"));
    }

    #[test]
    fn test_deserialize_from_nested_source() {
        let source = config::Config::builder()
            .set_override("twilio.account_sid", "AC123")
            .unwrap()
            .set_override("twilio.region", "ie1")
            .unwrap()
            .set_override("twilio.token_ttl", "15m")
            .unwrap()
            .set_override("access.allowed_domains", "x.com, y.org")
            .unwrap()
            .set_override("access.when_unrestricted", "deny")
            .unwrap()
            .set_override("auth.protect_token", "false")
            .unwrap()
            .build()
            .unwrap();

        let config: Config = source.try_deserialize().unwrap();

        assert_eq!(config.twilio.account_sid.as_deref(), Some("AC123"));
        assert_eq!(config.twilio.region.as_deref(), Some("ie1"));
        assert_eq!(config.twilio.token_ttl, Duration::from_secs(15 * 60));
        assert_eq!(config.access.allowed_domains, "x.com, y.org");
        assert_eq!(config.access.when_unrestricted, UnrestrictedPolicy::DenyAll);
        assert!(!config.auth.protect_token);
    }
}
