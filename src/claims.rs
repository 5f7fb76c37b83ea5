//! Access-credential claims decoding.
//!
//! The access token is a JWT whose payload carries the identity claims.
//! This module only decodes the payload segment - signature verification
//! belongs to the identity provider, not to a client that merely needs to
//! read its own expiry and display fields.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed token: expected three dot-separated segments")]
    MalformedToken,

    #[error("Invalid base64 in token payload")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Invalid claims JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Claims carried in the access token payload.
///
/// The provider emits the subject under `user_id`; older token versions
/// used `id`, so both are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    #[serde(alias = "id")]
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry, seconds since epoch
    pub exp: i64,
    /// Issued-at, seconds since epoch
    pub iat: i64,
}

/// The application-visible projection of `Claims`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            username: self.username.clone(),
        }
    }
}

/// Decode the claims from an access token without verifying the signature.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let payload = token.split('.').nth(1).ok_or(DecodeError::MalformedToken)?;

    // JWTs are unpadded base64url, but tolerate padded payloads too
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| URL_SAFE.decode(payload))?;

    Ok(serde_json::from_slice(&bytes)?)
}

/// Whether the token's `exp` claim is in the past at `now` (Unix seconds).
///
/// An undecodable token reads as expired - a credential we cannot inspect
/// is never trusted, so the caller is forced into renewal or logout.
pub fn is_expired(token: &str, now: i64) -> bool {
    match decode(token) {
        Ok(claims) => claims.exp < now,
        Err(e) => {
            tracing::debug!(error = %e, "Token failed to decode, treating as expired");
            true
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Build an unsigned JWT with the given payload JSON.
    pub(crate) fn make_token(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{}.{}.sig", header, body)
    }

    fn sample_token(exp: i64) -> String {
        make_token(&serde_json::json!({
            "user_id": 1,
            "username": "admin",
            "first_name": "admin",
            "last_name": "admin",
            "email": "admin@example.com",
            "exp": exp,
            "iat": exp - 86_400,
        }))
    }

    #[test]
    fn test_decode_valid_token() {
        let claims = decode(&sample_token(1_680_000_000)).unwrap();
        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.email.as_deref(), Some("admin@example.com"));
        assert_eq!(claims.exp, 1_680_000_000);
    }

    #[test]
    fn test_decode_accepts_id_alias() {
        let token = make_token(&serde_json::json!({
            "id": 7,
            "username": "a",
            "exp": 100,
            "iat": 0,
        }));
        let claims = decode(&token).unwrap();
        assert_eq!(claims.user_id, 7);
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        assert!(decode("").is_err());
        assert!(decode("no-dots-here").is_err());
        assert!(decode("a.!!!not-base64!!!.c").is_err());
        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode(b"plain text"));
        assert!(decode(&not_json).is_err());
    }

    #[test]
    fn test_is_expired_respects_exp() {
        let token = sample_token(1_000);
        assert!(!is_expired(&token, 999));
        assert!(is_expired(&token, 1_001));
    }

    #[test]
    fn test_is_expired_fails_closed_on_garbage() {
        assert!(is_expired("garbage", 0));
        assert!(is_expired("", i64::MAX));
        assert!(is_expired("a.b.c", i64::MIN));
    }

    #[test]
    fn test_identity_projection() {
        let claims = decode(&sample_token(1_000)).unwrap();
        let identity = claims.identity();
        assert_eq!(identity.user_id, 1);
        assert_eq!(identity.username, "admin");
    }
}
