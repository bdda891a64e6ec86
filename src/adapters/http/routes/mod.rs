pub mod books;

use axum::{Router, middleware};

use crate::adapters::http::{app_state::AppState, middleware::auth_middleware};

/// Every book route sits behind the auth pipeline.
pub fn router(app_state: AppState) -> Router<AppState> {
    Router::new().nest(
        "/books",
        books::router().route_layer(middleware::from_fn_with_state(
            app_state,
            auth_middleware,
        )),
    )
}
