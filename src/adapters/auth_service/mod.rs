use async_trait::async_trait;
use reqwest::Client;

use crate::{
    app_error::{AppError, AppResult},
    use_cases::auth::TokenRefresher,
};

/// Client for the auth service's `GET /auth/newAccessToken` endpoint.
#[derive(Clone)]
pub struct HttpTokenRefresher {
    client: Client,
    new_token_url: String,
}

impl HttpTokenRefresher {
    pub fn new(client: Client, auth_base_url: &str) -> Self {
        Self {
            client,
            new_token_url: format!(
                "{}/auth/newAccessToken",
                auth_base_url.trim_end_matches('/')
            ),
        }
    }
}

/// The endpoint answers with the bare token; a JSON string is accepted too.
fn parse_token_body(body: &str) -> Option<String> {
    let body = body.trim();
    let token = if body.starts_with('"') {
        serde_json::from_str::<String>(body).ok()?
    } else {
        body.to_string()
    };
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let response = self
            .client
            .get(&self.new_token_url)
            .bearer_auth(refresh_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "auth service refused refresh with status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service body unreadable: {e}")))?;

        parse_token_body(&body)
            .ok_or_else(|| AppError::Upstream("auth service returned no access token".into()))
    }
}
