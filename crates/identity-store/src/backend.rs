//! Persistence backends for the identity store.

use crate::error::StoreError;
use crate::types::StoreData;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};

/// JSON file storage, rewritten atomically on every change.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Save a snapshot using temp file + rename.
    pub async fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(data)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &bytes).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!("Saved identity store ({} bytes) to {:?}", bytes.len(), self.path);
        Ok(())
    }

    /// Load a snapshot. A missing or empty file yields an empty store.
    pub async fn load(&self) -> Result<StoreData, StoreError> {
        if !self.path.exists() {
            info!(
                "Identity store file not found at {:?}, starting empty",
                self.path
            );
            return Ok(StoreData::default());
        }

        let bytes = fs::read(&self.path).await?;
        if bytes.is_empty() {
            warn!("Identity store file is empty, starting empty");
            return Ok(StoreData::default());
        }

        let data: StoreData = serde_json::from_slice(&bytes)?;
        info!(
            "Loaded identity store with {} users and {} sessions from {:?}",
            data.users.len(),
            data.sessions.len(),
            self.path
        );
        Ok(data)
    }
}

/// Hosted SQL database schemes.
const REMOTE_SCHEMES: [&str; 3] = ["libsql:", "http:", "https:"];

/// Storage backend, chosen once when the store is opened.
pub enum Backend {
    /// JSON file on local disk
    File(FileBackend),
    /// In-memory only (no persistence)
    Memory,
}

impl Backend {
    /// Parse a store URL: `memory:` or `file:<path>`.
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let url = url.trim();
        if url.is_empty() || url == "memory:" || url == "memory" {
            return Ok(Backend::Memory);
        }

        if REMOTE_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
            return Err(StoreError::RemoteDatabase(url.to_string()));
        }

        match url.strip_prefix("file:") {
            Some(path) if !path.is_empty() => {
                Ok(Backend::File(FileBackend::new(path.trim_start_matches("//"))))
            }
            _ => Err(StoreError::UnsupportedUrl(url.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::File(_) => "file",
            Backend::Memory => "memory",
        }
    }

    pub async fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        match self {
            Backend::File(f) => f.save(data).await,
            Backend::Memory => Ok(()),
        }
    }

    pub async fn load(&self) -> Result<StoreData, StoreError> {
        match self {
            Backend::File(f) => f.load().await,
            Backend::Memory => Ok(StoreData::default()),
        }
    }
}
