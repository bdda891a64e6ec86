//! Locating the access/refresh token pair on an incoming request, and encoding
//! tokens so they can travel in a URL to a sibling service.
//!
//! Precedence, first match wins:
//! 1. `accessToken` + `refreshToken` query parameters (both required, base64 + percent-encoded)
//! 2. `Authorization: Bearer <token>`, with the refresh token taken from the cookie jar
//! 3. `accessToken` / `refreshToken` cookies
//! 4. a pair attached to the request by an upstream stage

use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use thiserror::Error;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const ACCESS_TOKEN_PARAM: &str = "accessToken";
pub const REFRESH_TOKEN_PARAM: &str = "refreshToken";

/// Characters `encodeURIComponent` leaves alone; everything else is escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Standard alphabet, padding optional on input.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Query,
    BearerHeader,
    Cookie,
    Upstream,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Query => "query",
            CredentialSource::BearerHeader => "bearer_header",
            CredentialSource::Cookie => "cookie",
            CredentialSource::Upstream => "upstream",
        }
    }
}

/// Raw candidate values read off a request. Empty strings count as absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct CredentialSources<'a> {
    pub query_access: Option<&'a str>,
    pub query_refresh: Option<&'a str>,
    pub authorization: Option<&'a str>,
    pub cookie_access: Option<&'a str>,
    pub cookie_refresh: Option<&'a str>,
    pub upstream: Option<&'a CredentialPair>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenDecodeError {
    #[error("percent-encoding is not valid UTF-8")]
    Percent,
    #[error("token is not valid base64")]
    Base64,
    #[error("decoded token is not valid UTF-8")]
    Utf8,
}

/// Returns the first credential pair found, or `None` when no source carries an
/// access token.
pub fn extract(
    sources: &CredentialSources<'_>,
) -> Result<Option<(CredentialSource, CredentialPair)>, TokenDecodeError> {
    if let (Some(access), Some(refresh)) = (
        non_empty(sources.query_access),
        non_empty(sources.query_refresh),
    ) {
        let pair = CredentialPair {
            access_token: decode_token(access)?,
            refresh_token: Some(decode_token(refresh)?),
        };
        return Ok(Some((CredentialSource::Query, pair)));
    }

    if let Some(token) = sources.authorization.and_then(bearer_token) {
        let pair = CredentialPair {
            access_token: token.to_string(),
            refresh_token: non_empty(sources.cookie_refresh).map(str::to_string),
        };
        return Ok(Some((CredentialSource::BearerHeader, pair)));
    }

    if let Some(access) = non_empty(sources.cookie_access) {
        let pair = CredentialPair {
            access_token: access.to_string(),
            refresh_token: non_empty(sources.cookie_refresh).map(str::to_string),
        };
        return Ok(Some((CredentialSource::Cookie, pair)));
    }

    if let Some(pair) = sources.upstream
        && !pair.access_token.is_empty()
    {
        return Ok(Some((CredentialSource::Upstream, pair.clone())));
    }

    Ok(None)
}

/// Base64 then percent-encode a token for embedding in a query string.
pub fn encode_token(token: &str) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(token.as_bytes());
    utf8_percent_encode(&b64, URI_COMPONENT).to_string()
}

/// Reverse of [`encode_token`]. Accepts values that were already percent-decoded
/// once by the query parser, including a `+` that turned into a space.
pub fn decode_token(encoded: &str) -> Result<String, TokenDecodeError> {
    let unescaped = percent_decode_str(encoded)
        .decode_utf8()
        .map_err(|_| TokenDecodeError::Percent)?;
    let b64 = unescaped.trim().replace(' ', "+");
    let bytes = LENIENT_BASE64
        .decode(b64.as_bytes())
        .map_err(|_| TokenDecodeError::Base64)?;
    String::from_utf8(bytes).map_err(|_| TokenDecodeError::Utf8)
}

/// Splits `Bearer <token>`; anything other than exactly two parts is not a match.
fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
