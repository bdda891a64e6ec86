use crate::{
    adapters::{
        auth_service::HttpTokenRefresher, author_service::HttpAuthorDirectory,
        http::app_state::AppState,
    },
    infra::{config::AppConfig, http_client, postgres_persistence},
    use_cases::{
        auth::{AuthUseCases, TokenRefresher},
        book::{AuthorDirectory, BookRepo, BookUseCases},
    },
};
use secrecy::{ExposeSecret, SecretString};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);

    let refresh_client = http_client::try_build_client_with_timeout(config.refresh_timeout)?;
    let refresher = Arc::new(HttpTokenRefresher::new(
        refresh_client,
        &config.auth_base_url,
    ));
    let authors = Arc::new(HttpAuthorDirectory::new(
        http_client::try_build_client()?,
        &config.author_base_url,
    ));

    let auth_use_cases = AuthUseCases::new(
        SecretString::new(config.jwt_secret.expose_secret().into()),
        config.jwt_leeway_secs,
        refresher as Arc<dyn TokenRefresher>,
        config.refresh_timeout,
    );

    let book_use_cases = BookUseCases::new(
        postgres_arc as Arc<dyn BookRepo>,
        authors as Arc<dyn AuthorDirectory>,
    );

    Ok(AppState {
        config: Arc::new(config),
        auth_use_cases: Arc::new(auth_use_cases),
        book_use_cases: Arc::new(book_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "book_service=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don't show target (module path)
        .with_level(true)
        .pretty();

    // File (structured JSON logs); skipped on a read-only filesystem
    let json_layer = match File::create("app.log") {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
        ),
        Err(err) => {
            eprintln!("app.log unavailable, logging to console only: {err}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
