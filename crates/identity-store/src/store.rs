//! Identity store with pluggable persistence and TTL expiration.

use crate::backend::Backend;
use crate::error::StoreError;
use crate::types::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// How often expired sessions and verification tokens are purged.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Store for users, linked accounts, sessions and verification tokens.
///
/// Every mutation is written through to the backend before the lock is
/// released, so a file-backed store never lags behind memory.
#[derive(Clone)]
pub struct IdentityStore {
    data: Arc<RwLock<StoreData>>,
    backend: Arc<Backend>,
}

impl IdentityStore {
    /// Open a store from a URL (`memory:` or `file:<path>`).
    ///
    /// Spawns a background task to periodically purge expired records.
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let backend = Backend::from_url(url)?;
        let data = backend.load().await?;

        let store = Self {
            data: Arc::new(RwLock::new(data)),
            backend: Arc::new(backend),
        };

        let cleanup_store = store.clone();
        tokio::spawn(async move {
            cleanup_store.cleanup_loop().await;
        });

        info!("Identity store opened (backend={})", store.backend_name());
        Ok(store)
    }

    /// Memory-only store.
    pub fn memory() -> Self {
        Self {
            data: Arc::new(RwLock::new(StoreData::default())),
            backend: Arc::new(Backend::Memory),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    async fn cleanup_loop(&self) {
        loop {
            tokio::time::sleep(CLEANUP_INTERVAL).await;

            match self.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!("Purged {} expired identity records", removed),
                Err(e) => warn!("Failed to purge expired identity records: {}", e),
            }
        }
    }

    /// Remove expired sessions and verification tokens.
    pub async fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut data = self.data.write().await;
        let removed = data.purge_expired(Utc::now());
        if removed > 0 {
            self.backend.save(&data).await?;
        }
        Ok(removed)
    }

    pub async fn get_user(&self, id: &str) -> Option<User> {
        self.data.read().await.users.get(id).cloned()
    }

    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        self.data.read().await.user_by_email(email).cloned()
    }

    /// Find or create the user for `email` and mark the address verified now.
    #[instrument(skip(self))]
    pub async fn upsert_verified_user(&self, email: &str) -> Result<User, StoreError> {
        let mut data = self.data.write().await;
        let now = Utc::now();

        let existing_id = data.user_by_email(email).map(|u| u.id.clone());
        let id = match existing_id {
            Some(id) => id,
            None => {
                let user = User::new(email);
                let id = user.id.clone();
                info!(user_id = %id, "Created user");
                data.users.insert(id.clone(), user);
                id
            }
        };

        let user = data
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::UserNotFound(id.clone()))?;
        user.email_verified = Some(now);
        let user = user.clone();

        self.backend.save(&data).await?;
        Ok(user)
    }

    /// Link a provider account to a user. Linking the same account twice is a no-op.
    pub async fn link_account(&self, account: LinkedAccount) -> Result<(), StoreError> {
        let mut data = self.data.write().await;

        if !data.users.contains_key(&account.user_id) {
            return Err(StoreError::UserNotFound(account.user_id));
        }

        let exists = data.accounts.iter().any(|a| {
            a.provider == account.provider && a.provider_account_id == account.provider_account_id
        });
        if exists {
            return Ok(());
        }

        data.accounts.push(account);
        self.backend.save(&data).await
    }

    pub async fn accounts_for_user(&self, user_id: &str) -> Vec<LinkedAccount> {
        self.data
            .read()
            .await
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Create a session for a user, expiring at `expires`.
    #[instrument(skip(self))]
    pub async fn create_session(
        &self,
        user_id: &str,
        expires: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let mut data = self.data.write().await;

        if !data.users.contains_key(user_id) {
            return Err(StoreError::UserNotFound(user_id.to_string()));
        }

        let session = Session {
            session_token: random_hex(32),
            user_id: user_id.to_string(),
            expires,
        };
        data.sessions
            .insert(session.session_token.clone(), session.clone());

        self.backend.save(&data).await?;
        debug!(user_id = %user_id, "Created session");
        Ok(session)
    }

    /// Look up a live session and its user. Expired sessions are not returned.
    pub async fn get_session_and_user(&self, session_token: &str) -> Option<(Session, User)> {
        let data = self.data.read().await;
        let session = data.sessions.get(session_token)?;
        if session.is_expired(Utc::now()) {
            return None;
        }
        let user = data.users.get(&session.user_id)?;
        Some((session.clone(), user.clone()))
    }

    /// Delete a session. Returns whether it existed.
    pub async fn delete_session(&self, session_token: &str) -> Result<bool, StoreError> {
        let mut data = self.data.write().await;
        let removed = data.sessions.remove(session_token).is_some();
        if removed {
            self.backend.save(&data).await?;
        }
        Ok(removed)
    }

    pub async fn create_verification_token(
        &self,
        token: VerificationToken,
    ) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        data.verification_tokens.push(token);
        self.backend.save(&data).await
    }

    /// Consume a verification token. It is removed whether or not it has expired;
    /// only a live token is returned.
    #[instrument(skip(self, token_hash))]
    pub async fn use_verification_token(
        &self,
        identifier: &str,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, StoreError> {
        let mut data = self.data.write().await;
        let identifier = identifier.to_lowercase();

        let position = data
            .verification_tokens
            .iter()
            .position(|t| t.identifier == identifier && t.token_hash == token_hash);

        let Some(position) = position else {
            return Ok(None);
        };

        let token = data.verification_tokens.remove(position);
        self.backend.save(&data).await?;

        if token.is_expired(Utc::now()) {
            debug!("Verification token expired");
            return Ok(None);
        }
        Ok(Some(token))
    }

    pub async fn user_count(&self) -> usize {
        self.data.read().await.users.len()
    }

    pub async fn session_count(&self) -> usize {
        self.data.read().await.sessions.len()
    }
}
