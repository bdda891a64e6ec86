use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

/// MIME types accepted for cover uploads.
pub const COVER_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl CoverImage {
    pub fn is_allowed_type(mime_type: &str) -> bool {
        COVER_MIME_TYPES.contains(&mime_type)
    }

    /// `data:` URI used to inline the cover into rendered pages.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    /// Author-service id of the book's author.
    pub author: String,
    pub publish_date: NaiveDate,
    pub page_count: i32,
    pub description: Option<String>,
    #[serde(skip)]
    pub cover: Option<CoverImage>,
    pub cover_image_type: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Validated input for creating or updating a book.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub publish_date: NaiveDate,
    pub page_count: i32,
    pub description: Option<String>,
    /// `None` keeps the stored cover on update.
    pub cover: Option<CoverImage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    /// Case-insensitive regular expression matched against the title.
    pub title_pattern: Option<String>,
    pub author: Option<String>,
    /// Inclusive upper bound on `publish_date`.
    pub published_before: Option<NaiveDate>,
    /// Inclusive lower bound on `publish_date`.
    pub published_after: Option<NaiveDate>,
    pub newest_first: bool,
    pub limit: Option<i64>,
}
