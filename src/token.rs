//! Bearer token codec.
//!
//! Decodes the `header.payload.signature` tokens issued by the backend into
//! structured claims. The signature is never verified here — tokens only
//! reach this codec from the login response or our own persisted slot, and
//! every privileged operation is re-verified server-side.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Token is not a three-part structure")]
    Malformed,
    #[error("Payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Payload is missing required field: {0}")]
    MissingField(&'static str),
}

/// Claims the backend embeds in a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject identity (the account email).
    pub email: String,
    /// Expiry as epoch seconds.
    pub exp: i64,
}

#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(|| DateTime::<Utc>::MIN_UTC)
    }

    /// A token is valid only while its expiry is strictly in the future.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Decode a raw token into its claims without contacting any server.
pub fn decode(raw: &str) -> Result<Claims, DecodeError> {
    let mut parts = raw.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(DecodeError::Malformed);
    };
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(DecodeError::Malformed);
    }

    let decoded = URL_SAFE_NO_PAD.decode(payload)?;
    let raw: RawClaims = serde_json::from_slice(&decoded)?;

    let email = raw.email.ok_or(DecodeError::MissingField("email"))?;
    let exp = raw.exp.ok_or(DecodeError::MissingField("exp"))?;

    Ok(Claims { email, exp })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::mint_token;

    #[test]
    fn test_decode_round_trip() {
        let exp = Utc::now().timestamp() + 3600;
        let token = mint_token("a@b.com", exp);

        let claims = decode(&token).unwrap();
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.exp, exp);
        assert!(!claims.is_expired(Utc::now()));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for raw in [
            "",
            "not-a-token",
            "one.two",
            "one.two.three.four",
            "..",
            "a..c",
        ] {
            assert!(matches!(decode(raw), Err(DecodeError::Malformed)), "{raw:?}");
        }
    }

    #[test]
    fn test_decode_rejects_bad_payload() {
        // Valid structure, payload not base64url
        assert!(matches!(
            decode("hdr.!!!.sig"),
            Err(DecodeError::Base64(_))
        ));

        // Valid base64url, not JSON
        let payload = URL_SAFE_NO_PAD.encode(b"garbage");
        assert!(matches!(
            decode(&format!("hdr.{payload}.sig")),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"exp": 123}"#);
        assert!(matches!(
            decode(&format!("hdr.{payload}.sig")),
            Err(DecodeError::MissingField("email"))
        ));

        let payload = URL_SAFE_NO_PAD.encode(br#"{"email": "a@b.com"}"#);
        assert!(matches!(
            decode(&format!("hdr.{payload}.sig")),
            Err(DecodeError::MissingField("exp"))
        ));
    }

    #[test]
    fn test_expired_boundary() {
        let now = Utc::now();
        let claims = Claims {
            email: "a@b.com".to_string(),
            exp: now.timestamp(),
        };
        // Expiry must be strictly in the future
        assert!(claims.is_expired(now));
    }
}
