//! Identity store records.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A user who has signed in at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    /// Lowercased, unique across users
    pub email: String,
    pub email_verified: Option<DateTime<Utc>>,
    pub image: Option<String>,
}

impl User {
    pub fn new(email: &str) -> Self {
        Self {
            id: random_hex(16),
            name: None,
            email: email.to_lowercase(),
            email_verified: None,
            image: None,
        }
    }
}

/// Link between a user and the provider that authenticated them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub user_id: String,
    /// Account type (e.g. "email")
    pub kind: String,
    pub provider: String,
    pub provider_account_id: String,
}

/// Browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_token: String,
    pub user_id: String,
    pub expires: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

/// Pending sign-in link. Only a hash of the emailed token is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationToken {
    /// Email address the link was sent to
    pub identifier: String,
    pub token_hash: String,
    pub expires: DateTime<Utc>,
}

impl VerificationToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

/// Full store contents, as persisted by file-backed stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    /// Users indexed by id
    #[serde(default)]
    pub users: HashMap<String, User>,

    #[serde(default)]
    pub accounts: Vec<LinkedAccount>,

    /// Sessions indexed by session token
    #[serde(default)]
    pub sessions: HashMap<String, Session>,

    #[serde(default)]
    pub verification_tokens: Vec<VerificationToken>,
}

impl StoreData {
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let email = email.to_lowercase();
        self.users.values().find(|u| u.email == email)
    }

    /// Drop expired sessions and verification tokens. Returns how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len() + self.verification_tokens.len();
        self.sessions.retain(|_, s| !s.is_expired(now));
        self.verification_tokens.retain(|t| !t.is_expired(now));
        before - (self.sessions.len() + self.verification_tokens.len())
    }
}

/// Random lowercase hex string of `bytes` random bytes.
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}
