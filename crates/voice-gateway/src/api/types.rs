//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Identity store backend in use
    pub store_backend: &'static str,
}

/// Inbound call webhook form. Only the fields the router needs are read.
#[derive(Debug, Default, Deserialize)]
pub struct VoiceWebhook {
    #[serde(rename = "To")]
    pub to: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
}

/// Sign-in form.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
}

/// Query parameters of a sign-in link.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub token: String,
    pub email: String,
}

/// Current session.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: SessionUser,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}
