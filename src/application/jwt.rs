use std::collections::HashSet;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::app_error::{AppError, AppResult};

/// Decoded payload of an access token minted by the auth service.
///
/// Only the registered claims this service looks at are typed; everything else
/// the auth service puts in the payload is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of checking an access token against the shared secret.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Valid(Claims),
    /// Signature checked out but `exp` has passed.
    Expired,
    /// Malformed token or bad signature.
    Invalid(String),
    /// Well-formed and signed, but refused for another reason (e.g. `nbf` in the future).
    Rejected(String),
}

/// Mints an HS256 access token. Production tokens come from the auth service;
/// this exists for tooling and tests that need tokens signed with the shared secret.
pub fn issue(
    sub: &str,
    secret: &SecretString,
    ttl: Duration,
    extra: serde_json::Map<String, serde_json::Value>,
) -> AppResult<String> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let exp = now + ttl.whole_seconds();
    let claims = Claims {
        sub: Some(sub.to_string()),
        iat: Some(now),
        exp: Some(exp),
        extra,
    };
    let header = Header::new(Algorithm::HS256);
    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn verify(token: &str, secret: &SecretString, leeway_secs: u64) -> Verification {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.leeway = leeway_secs;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    // Tokens without `exp` are accepted; when present it is enforced.
    validation.required_spec_claims = HashSet::new();

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    ) {
        Ok(data) => Verification::Valid(data.claims),
        Err(err) => match err.kind() {
            ErrorKind::ExpiredSignature => Verification::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Verification::Invalid(err.to_string()),
            _ => Verification::Rejected(err.to_string()),
        },
    }
}
