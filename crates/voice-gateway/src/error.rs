//! Error types for the voice gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use voice_types::ErrorBody;

/// Gateway error types.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing or invalid server configuration: {0}")]
    Config(String),

    #[error("Token signing failed: {0}")]
    TokenSigning(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Sign-in link is invalid or has expired")]
    InvalidLink,

    #[error("Not signed in")]
    Unauthorized,

    #[error("Email delivery error: {0}")]
    Mail(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to render call instructions: {0}")]
    Render(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            GatewayError::TokenSigning(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "TOKEN_SIGNING_ERROR")
            }
            GatewayError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "INVALID_EMAIL"),
            GatewayError::InvalidLink => (StatusCode::BAD_REQUEST, "INVALID_LINK"),
            GatewayError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            GatewayError::Mail(_) => (StatusCode::BAD_GATEWAY, "MAIL_ERROR"),
            GatewayError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            GatewayError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_ERROR"),
            GatewayError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
            GatewayError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorBody {
            error: self.to_string(),
            code: Some(code.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

impl From<identity_store::StoreError> for GatewayError {
    fn from(e: identity_store::StoreError) -> Self {
        GatewayError::Storage(e.to_string())
    }
}

impl From<mail_client::MailError> for GatewayError {
    fn from(e: mail_client::MailError) -> Self {
        match e {
            mail_client::MailError::InvalidRecipient(r) => GatewayError::InvalidEmail(r),
            other => GatewayError::Mail(other.to_string()),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for GatewayError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        GatewayError::TokenSigning(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_is_server_error() {
        let response = GatewayError::Config("TWILIO__API_KEY".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::InvalidLink.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::RateLimitExceeded.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            GatewayError::Mail("down".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_invalid_recipient_maps_to_invalid_email() {
        let err: GatewayError = mail_client::MailError::InvalidRecipient("nope".into()).into();
        assert!(matches!(err, GatewayError::InvalidEmail(_)));
    }
}
