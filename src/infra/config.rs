use std::{net::SocketAddr, time::Duration};

use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

pub struct AppConfig {
    /// Shared HS256 secret; the auth service signs access tokens with it.
    pub jwt_secret: SecretString,
    /// Base URL of the auth service, without a trailing slash.
    pub auth_base_url: String,
    /// Base URL of the author service, without a trailing slash.
    pub author_base_url: String,
    /// Public base URL of this service, used in rendered navigation.
    pub books_base_url: String,
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Upper bound on one refresh exchange with the auth service.
    pub refresh_timeout: Duration,
    /// Clock skew tolerated when checking `exp`.
    pub jwt_leeway_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET_KEY").into());

        let auth_base_url: Url = get_env("AUTH_BASEURL");
        let author_base_url: Url = get_env("AUTHOR_BASEURL");
        let books_base_url: Url = get_env("BOOKS_BASEURL");
        let database_url: String = get_env("DATABASE_URL");

        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3000".parse().unwrap());
        let refresh_timeout_secs: u64 = get_env_default("AUTH_REFRESH_TIMEOUT_SECS", 5);
        let jwt_leeway_secs: u64 = get_env_default("JWT_LEEWAY_SECS", 0);

        Self {
            jwt_secret,
            auth_base_url: base_url(&auth_base_url),
            author_base_url: base_url(&author_base_url),
            books_base_url: base_url(&books_base_url),
            database_url,
            bind_addr,
            refresh_timeout: Duration::from_secs(refresh_timeout_secs),
            jwt_leeway_secs,
        }
    }

    /// Where unauthenticated browsers are sent.
    pub fn login_url(&self) -> String {
        format!("{}/auth/login", self.auth_base_url)
    }
}

fn base_url(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}
