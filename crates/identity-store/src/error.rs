//! Identity store errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported store URL: {0}")]
    UnsupportedUrl(String),

    #[error("Remote database URLs are not supported ({0}); use file:<path> to persist")]
    RemoteDatabase(String),

    #[error("User not found: {0}")]
    UserNotFound(String),
}
