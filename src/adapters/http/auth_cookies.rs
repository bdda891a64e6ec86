use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;

use crate::{
    credentials::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
    use_cases::auth::{AuthFailure, AuthSession},
};

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Writes the session's tokens into the jar. The refresh cookie is left alone
/// when no refresh token is known.
pub fn sync_session_cookies(jar: CookieJar, session: &AuthSession) -> CookieJar {
    let jar = jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        session.access_token.clone(),
    ));
    match &session.refresh_token {
        Some(refresh) => jar.add(session_cookie(REFRESH_TOKEN_COOKIE, refresh.clone())),
        None => jar,
    }
}

/// Terminal response for a request the auth pipeline refused.
#[derive(Debug)]
pub struct AuthRejection {
    pub failure: AuthFailure,
    pub login_url: String,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        tracing::info!(failure = %self.failure, "Request rejected by auth pipeline");

        match self.failure {
            AuthFailure::CredentialMissing => unauthorized("Unauthorized: Token not found"),
            AuthFailure::Rejected => unauthorized("Unauthorized: Invalid token"),
            AuthFailure::InvalidCredential
            | AuthFailure::CredentialExpired
            | AuthFailure::RefreshFailed => found(&self.login_url),
        }
    }
}

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::CACHE_CONTROL, "no-store")],
        Json(json!({ "message": message })),
    )
        .into_response()
}
