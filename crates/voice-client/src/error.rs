//! Call client errors.

use thiserror::Error;

/// Shown when the token endpoint gives no reason.
pub const FETCH_FAILED: &str = "Failed to fetch token";

/// Credential fetch errors.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response, with the server's reason when it sent one
    #[error("Token request rejected: {}", .0.as_deref().unwrap_or(FETCH_FAILED))]
    Rejected(Option<String>),
}

impl ClientError {
    /// Text shown to the user for a failed fetch.
    pub fn status_message(&self) -> &str {
        match self {
            ClientError::Rejected(Some(reason)) => reason,
            _ => FETCH_FAILED,
        }
    }
}

/// A user action that cannot be taken in the current phase.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Device not ready")]
    NotReady,

    #[error("No destination entered")]
    MissingDestination,

    #[error("A call is already in progress")]
    Busy,

    #[error("No incoming call to answer")]
    NoPendingCall,

    #[error("No call to end")]
    NoActiveCall,

    #[error("Call failed: {0}")]
    CallFailed(String),

    #[error("Phone has been shut down")]
    Stopped,
}
