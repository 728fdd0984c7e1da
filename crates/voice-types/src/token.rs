//! Token endpoint payloads.

use crate::Region;
use serde::{Deserialize, Serialize};

/// Successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed access token
    pub token: String,

    /// Identity the token was minted for
    pub identity: String,

    /// Region the token is bound to; always present
    pub region: Region,
}

/// Error body returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_wire_format() {
        let response = TokenResponse {
            token: "eyJ".into(),
            identity: "user_abc".into(),
            region: Region::Us1,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["identity"], "user_abc");
        assert_eq!(json["region"], "us1");
    }

    #[test]
    fn test_error_body_without_code() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(body.error, "boom");
        assert!(body.code.is_none());
    }
}
