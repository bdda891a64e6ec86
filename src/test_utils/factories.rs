//! Test data factories and token helpers.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use secrecy::SecretString;
use uuid::Uuid;

use crate::{entities::book::Book, infra::config::AppConfig, jwt};

pub const TEST_JWT_SECRET: &str = "test-shared-secret-for-book-service";

pub fn test_secret() -> SecretString {
    SecretString::new(TEST_JWT_SECRET.into())
}

/// Access token signed with the test secret, valid for an hour.
pub fn valid_token(sub: &str) -> String {
    jwt::issue(
        sub,
        &test_secret(),
        time::Duration::hours(1),
        serde_json::Map::new(),
    )
    .unwrap()
}

/// Access token signed with the test secret that expired an hour ago.
pub fn expired_token(sub: &str) -> String {
    jwt::issue(
        sub,
        &test_secret(),
        time::Duration::hours(-1),
        serde_json::Map::new(),
    )
    .unwrap()
}

/// Access token signed with the test secret whose `nbf` is an hour away.
pub fn not_yet_valid_token(sub: &str) -> String {
    let nbf = time::OffsetDateTime::now_utc().unix_timestamp() + 3_600;
    let mut extra = serde_json::Map::new();
    extra.insert("nbf".into(), nbf.into());
    jwt::issue(sub, &test_secret(), time::Duration::hours(2), extra).unwrap()
}

pub fn test_datetime() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

/// Create a test book with sensible defaults.
pub fn create_test_book(overrides: impl FnOnce(&mut Book)) -> Book {
    let mut book = Book {
        id: Uuid::new_v4(),
        title: "The Left Hand of Darkness".to_string(),
        author: "author-1".to_string(),
        publish_date: NaiveDate::from_ymd_opt(1969, 3, 1).unwrap(),
        page_count: 304,
        description: Some("A diplomat on a frozen world.".to_string()),
        cover: None,
        cover_image_type: None,
        created_at: test_datetime(),
    };
    overrides(&mut book);
    book
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: test_secret(),
        auth_base_url: "http://auth.test".to_string(),
        author_base_url: "http://authors.test".to_string(),
        books_base_url: "http://books.test".to_string(),
        database_url: "postgres://unused".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        refresh_timeout: Duration::from_millis(500),
        jwt_leeway_secs: 0,
    }
}
