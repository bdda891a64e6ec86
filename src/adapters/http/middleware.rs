use axum::{
    extract::{Query, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::{
    adapters::http::{
        app_state::AppState,
        auth_cookies::{AuthRejection, sync_session_cookies},
    },
    credentials::{ACCESS_TOKEN_COOKIE, CredentialPair, CredentialSources, REFRESH_TOKEN_COOKIE},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialQuery {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Gate for every book route. Runs the auth pipeline, then either answers with
/// the rejection or calls the handler exactly once with an `AuthSession`
/// extension and the session cookies applied to the response.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<(CookieJar, Response), AuthRejection> {
    // A query string that fails to parse is treated as carrying no credentials.
    let query = match Query::<CredentialQuery>::try_from_uri(request.uri()) {
        Ok(Query(query)) => query,
        Err(err) => {
            tracing::debug!(error = %err, "Ignoring unparseable credential query");
            CredentialQuery::default()
        }
    };
    let upstream = request.extensions().get::<CredentialPair>().cloned();

    let result = {
        let sources = CredentialSources {
            query_access: query.access_token.as_deref(),
            query_refresh: query.refresh_token.as_deref(),
            authorization: request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok()),
            cookie_access: jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value()),
            cookie_refresh: jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value()),
            upstream: upstream.as_ref(),
        };
        app_state.auth_use_cases.authenticate(&sources).await
    };

    let session = result.map_err(|failure| AuthRejection {
        failure,
        login_url: app_state.config.login_url(),
    })?;

    tracing::debug!(refreshed = session.refreshed, "Request authenticated");

    let jar = sync_session_cookies(jar, &session);
    request.extensions_mut().insert(session);

    Ok((jar, next.run(request).await))
}
