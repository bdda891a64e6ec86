use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    app_error::{AppError, AppResult},
    entities::author::Author,
    use_cases::book::AuthorDirectory,
};

/// Client for the author service. Every call carries the caller's access token.
#[derive(Clone)]
pub struct HttpAuthorDirectory {
    client: Client,
    base_url: String,
}

impl HttpAuthorDirectory {
    pub fn new(client: Client, author_base_url: &str) -> Self {
        Self {
            client,
            base_url: author_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("author service unreachable: {e}")))?;

        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| AppError::Upstream(format!("author service sent bad JSON: {e}"))),
            StatusCode::NOT_FOUND => Err(AppError::NotFound),
            status => Err(AppError::Upstream(format!(
                "author service responded with {status}"
            ))),
        }
    }
}

#[async_trait]
impl AuthorDirectory for HttpAuthorDirectory {
    async fn get_by_id(&self, author_id: &str, access_token: &str) -> AppResult<Author> {
        let request = self
            .client
            .get(format!("{}/authors/getById", self.base_url))
            .query(&[("id", author_id)])
            .bearer_auth(access_token);
        self.fetch(request).await
    }

    async fn list_all(&self, access_token: &str) -> AppResult<Vec<Author>> {
        let request = self
            .client
            .get(format!("{}/authors/getAllAuthors", self.base_url))
            .bearer_auth(access_token);
        self.fetch(request).await
    }
}
