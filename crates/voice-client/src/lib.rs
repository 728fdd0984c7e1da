//! Browser call client.
//!
//! Fetches a voice access token from the gateway, registers a telephony
//! [`Device`] with it and drives calls through the [`Phone`] state machine.

mod device;
mod error;
mod machine;
mod runtime;
mod token;

pub use device::{
    Codec, Device, DeviceEvent, DeviceOptions, DeviceProvider, EventSender, ProviderError,
    DEVICE_ERROR,
};
pub use error::{ActionError, ClientError, FETCH_FAILED};
pub use machine::{status, CallAttempt, Direction, Phase, Phone, Registration, StatusUpdate};
pub use runtime::{spawn, Command, PhoneHandle};
pub use token::{CredentialSource, TokenClient};

#[cfg(test)]
mod tests {
    use super::*;
    use voice_types::Region;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_token_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/token"))
            .and(header("cookie", "session_token=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "eyJ.payload.sig",
                "identity": "user_k3v9x0q2ab",
                "region": "ie1"
            })))
            .mount(&mock_server)
            .await;

        let client = TokenClient::new(mock_server.uri())
            .unwrap()
            .with_session("abc");
        let token = client.fetch_token().await.unwrap();

        assert_eq!(token.identity, "user_k3v9x0q2ab");
        assert_eq!(token.region, Region::Ie1);
    }

    #[tokio::test]
    async fn test_fetch_token_error_reason() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "Missing required Twilio configuration",
                "code": "CONFIG_ERROR"
            })))
            .mount(&mock_server)
            .await;

        let client = TokenClient::new(mock_server.uri()).unwrap();
        let err = client.fetch_token().await.unwrap_err();

        assert_eq!(err.status_message(), "Missing required Twilio configuration");
    }

    #[tokio::test]
    async fn test_fetch_token_error_without_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = TokenClient::new(mock_server.uri()).unwrap();
        let err = client.fetch_token().await.unwrap_err();

        assert!(matches!(err, ClientError::Rejected(None)));
        assert_eq!(err.status_message(), FETCH_FAILED);
    }

    #[tokio::test]
    async fn test_fetch_token_bad_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = TokenClient::new(mock_server.uri()).unwrap();
        let err = client.fetch_token().await.unwrap_err();

        assert!(matches!(err, ClientError::Json(_)));
        assert_eq!(err.status_message(), FETCH_FAILED);
    }

    #[tokio::test]
    async fn test_fetch_token_unreachable() {
        let client = TokenClient::new("http://127.0.0.1:1").unwrap();
        let err = client.fetch_token().await.unwrap_err();

        assert!(matches!(err, ClientError::Http(_)));
        assert_eq!(err.status_message(), FETCH_FAILED);
    }
}
