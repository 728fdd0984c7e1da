//! Voice access token encoding.
//!
//! Header and claims follow the platform's access token format; the HS256
//! signature itself comes from `jsonwebtoken`.

use crate::error::GatewayError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{Algorithm, EncodingKey};
use serde::{Deserialize, Serialize};

/// Content type marking a platform access token.
pub const TOKEN_CONTENT_TYPE: &str = "twilio-fpa;v=1";

#[derive(Debug, Serialize)]
struct TokenHeader<'a> {
    typ: &'static str,
    alg: &'static str,
    cty: &'static str,
    /// Region the token is bound to
    #[serde(skip_serializing_if = "Option::is_none")]
    twr: Option<&'a str>,
}

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub jti: String,
    /// API key SID
    pub iss: String,
    /// Account SID
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub grants: Grants,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    pub identity: String,
    pub voice: VoiceGrant,
}

/// Bidirectional voice capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceGrant {
    pub incoming: IncomingGrant,
    pub outgoing: OutgoingGrant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingGrant {
    pub allow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingGrant {
    pub application_sid: String,
}

impl VoiceGrant {
    /// Outgoing calls through `application_sid`, incoming calls allowed.
    pub fn bidirectional(application_sid: impl Into<String>) -> Self {
        Self {
            incoming: IncomingGrant { allow: true },
            outgoing: OutgoingGrant {
                application_sid: application_sid.into(),
            },
        }
    }
}

/// Unsigned access token.
#[derive(Debug, Clone)]
pub struct AccessToken<'a> {
    pub account_sid: &'a str,
    pub api_key: &'a str,
    pub identity: &'a str,
    pub region: Option<&'a str>,
    pub ttl_secs: i64,
    pub grant: VoiceGrant,
}

impl AccessToken<'_> {
    /// Claims for a token issued at `now` (unix seconds).
    pub fn claims(&self, now: i64) -> AccessTokenClaims {
        AccessTokenClaims {
            jti: format!("{}-{}", self.api_key, now),
            iss: self.api_key.to_string(),
            sub: self.account_sid.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
            grants: Grants {
                identity: self.identity.to_string(),
                voice: self.grant.clone(),
            },
        }
    }

    /// Sign the token with the API key secret.
    pub fn to_jwt(&self, secret: &str, now: i64) -> Result<String, GatewayError> {
        let header = TokenHeader {
            typ: "JWT",
            alg: "HS256",
            cty: TOKEN_CONTENT_TYPE,
            twr: self.region,
        };

        let header = serde_json::to_vec(&header)
            .map_err(|e| GatewayError::TokenSigning(e.to_string()))?;
        let claims = serde_json::to_vec(&self.claims(now))
            .map_err(|e| GatewayError::TokenSigning(e.to_string()))?;

        let message = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = jsonwebtoken::crypto::sign(
            message.as_bytes(),
            &EncodingKey::from_secret(secret.as_bytes()),
            Algorithm::HS256,
        )?;

        Ok(format!("{}.{}", message, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    fn token(region: Option<&'static str>) -> AccessToken<'static> {
        AccessToken {
            account_sid: "AC123",
            api_key: "SK456",
            identity: "user_abc",
            region,
            ttl_secs: 3600,
            grant: VoiceGrant::bidirectional("AP789"),
        }
    }

    fn header_json(jwt: &str) -> serde_json::Value {
        let segment = jwt.split('.').next().unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }

    #[test]
    fn test_claims_shape() {
        let claims = token(None).claims(1_700_000_000);

        assert_eq!(claims.jti, "SK456-1700000000");
        assert_eq!(claims.iss, "SK456");
        assert_eq!(claims.sub, "AC123");
        assert_eq!(claims.exp - claims.iat, 3600);

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["grants"]["identity"], "user_abc");
        assert_eq!(json["grants"]["voice"]["incoming"]["allow"], true);
        assert_eq!(json["grants"]["voice"]["outgoing"]["application_sid"], "AP789");
    }

    #[test]
    fn test_signed_token_verifies() {
        let now = chrono::Utc::now().timestamp();
        let jwt = token(None).to_jwt("secret", now).unwrap();

        let header = decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.cty.as_deref(), Some(TOKEN_CONTENT_TYPE));

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        let data = decode::<AccessTokenClaims>(
            &jwt,
            &DecodingKey::from_secret(b"secret"),
            &validation,
        )
        .unwrap();
        assert_eq!(data.claims.grants.identity, "user_abc");
    }

    #[test]
    fn test_wrong_secret_fails_verification() {
        let now = chrono::Utc::now().timestamp();
        let jwt = token(None).to_jwt("secret", now).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        let result = decode::<AccessTokenClaims>(
            &jwt,
            &DecodingKey::from_secret(b"other"),
            &validation,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_region_header() {
        let jwt = token(Some("ie1")).to_jwt("secret", 1_700_000_000).unwrap();
        assert_eq!(header_json(&jwt)["twr"], "ie1");

        let jwt = token(None).to_jwt("secret", 1_700_000_000).unwrap();
        assert!(header_json(&jwt).get("twr").is_none());
    }
}
