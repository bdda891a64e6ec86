use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    infra::config::AppConfig,
    use_cases::{auth::AuthUseCases, book::BookUseCases},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_use_cases: Arc<AuthUseCases>,
    pub book_use_cases: Arc<BookUseCases>,
}

impl FromRef<AppState> for Arc<BookUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.book_use_cases.clone()
    }
}
