use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    entities::{
        author::Author,
        book::{Book, BookDraft, BookFilter, CoverImage},
    },
};

pub const RECENTLY_ADDED_LIMIT: i64 = 10;
pub const BY_AUTHOR_LIMIT: i64 = 6;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Port to the book document store.
#[async_trait]
pub trait BookRepo: Send + Sync {
    async fn create(&self, draft: &BookDraft) -> AppResult<Book>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;
    async fn list(&self, filter: &BookFilter) -> AppResult<Vec<Book>>;
    /// Fails with `NotFound` when the book does not exist.
    async fn update(&self, id: Uuid, draft: &BookDraft) -> AppResult<Book>;
    /// Returns the deleted book, or `None` if there was nothing to delete.
    async fn delete(&self, id: Uuid) -> AppResult<Option<Book>>;
}

/// Port to the author service. Calls are made on behalf of the current user.
#[async_trait]
pub trait AuthorDirectory: Send + Sync {
    async fn get_by_id(&self, author_id: &str, access_token: &str) -> AppResult<Author>;
    async fn list_all(&self, access_token: &str) -> AppResult<Vec<Author>>;
}

/// Raw form fields as submitted by the book form. Kept as strings so a failed
/// submission can be re-rendered exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub publish_date: String,
    pub page_count: String,
    pub description: String,
    /// JSON `{"type": "<mime>", "data": "<base64>"}` produced by the upload widget.
    pub cover: String,
}

impl BookForm {
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            publish_date: book.publish_date.format(DATE_FORMAT).to_string(),
            page_count: book.page_count.to_string(),
            description: book.description.clone().unwrap_or_default(),
            cover: String::new(),
        }
    }

    pub fn to_draft(&self) -> AppResult<BookDraft> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput("Title is required".into()));
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(AppError::InvalidInput("Author is required".into()));
        }
        let publish_date = parse_date(&self.publish_date)?
            .ok_or_else(|| AppError::InvalidInput("Publish date is required".into()))?;
        let page_count: i32 = self
            .page_count
            .trim()
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| AppError::InvalidInput("Page count must be a positive number".into()))?;
        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(BookDraft {
            title: title.to_string(),
            author: author.to_string(),
            publish_date,
            page_count,
            description,
            cover: parse_cover(&self.cover)?,
        })
    }
}

#[derive(Deserialize)]
struct CoverUpload {
    #[serde(rename = "type")]
    mime_type: String,
    data: String,
}

/// Decodes the upload widget's JSON. Unsupported image types are dropped, not rejected.
fn parse_cover(raw: &str) -> AppResult<Option<CoverImage>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let upload: CoverUpload = serde_json::from_str(raw)
        .map_err(|_| AppError::InvalidInput("Cover upload is malformed".into()))?;
    if !CoverImage::is_allowed_type(&upload.mime_type) {
        tracing::debug!(mime_type = %upload.mime_type, "Ignoring cover with unsupported type");
        return Ok(None);
    }
    let data = base64::engine::general_purpose::STANDARD
        .decode(upload.data.as_bytes())
        .map_err(|_| AppError::InvalidInput("Cover image is not valid base64".into()))?;
    Ok(Some(CoverImage {
        data,
        mime_type: upload.mime_type,
    }))
}

/// Listing filters as they arrive in the query string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookSearch {
    pub title: String,
    pub published_before: String,
    pub published_after: String,
}

impl BookSearch {
    pub fn to_filter(&self) -> AppResult<BookFilter> {
        let title = self.title.trim();
        Ok(BookFilter {
            title_pattern: (!title.is_empty()).then(|| title.to_string()),
            published_before: parse_date(&self.published_before)?,
            published_after: parse_date(&self.published_after)?,
            ..Default::default()
        })
    }
}

fn parse_date(raw: &str) -> AppResult<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|_| AppError::InvalidInput(format!("Invalid date: {raw}")))
}

#[derive(Debug, Clone)]
pub struct BookDetails {
    pub book: Book,
    pub author: Author,
}

#[derive(Clone)]
pub struct BookUseCases {
    repo: Arc<dyn BookRepo>,
    authors: Arc<dyn AuthorDirectory>,
}

impl BookUseCases {
    pub fn new(repo: Arc<dyn BookRepo>, authors: Arc<dyn AuthorDirectory>) -> Self {
        Self { repo, authors }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, search: &BookSearch) -> AppResult<Vec<Book>> {
        let filter = search.to_filter()?;
        self.repo.list(&filter).await
    }

    pub async fn recently_added(&self) -> AppResult<Vec<Book>> {
        let filter = BookFilter {
            newest_first: true,
            limit: Some(RECENTLY_ADDED_LIMIT),
            ..Default::default()
        };
        self.repo.list(&filter).await
    }

    pub async fn by_author(&self, author_id: &str) -> AppResult<Vec<Book>> {
        let filter = BookFilter {
            author: Some(author_id.to_string()),
            limit: Some(BY_AUTHOR_LIMIT),
            ..Default::default()
        };
        self.repo.list(&filter).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Book> {
        self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// Book plus its author's details from the author service.
    #[instrument(skip(self, access_token))]
    pub async fn details(&self, id: Uuid, access_token: &str) -> AppResult<BookDetails> {
        let book = self.get(id).await?;
        let author = self.authors.get_by_id(&book.author, access_token).await?;
        Ok(BookDetails { book, author })
    }

    #[instrument(skip(self, access_token))]
    pub async fn authors(&self, access_token: &str) -> AppResult<Vec<Author>> {
        self.authors.list_all(access_token).await
    }

    #[instrument(skip(self, form), fields(title = %form.title))]
    pub async fn create(&self, form: &BookForm) -> AppResult<Book> {
        let draft = form.to_draft()?;
        let book = self.repo.create(&draft).await?;
        tracing::info!(book_id = %book.id, "Book created");
        Ok(book)
    }

    #[instrument(skip(self, form))]
    pub async fn update(&self, id: Uuid, form: &BookForm) -> AppResult<Book> {
        let draft = form.to_draft()?;
        let book = self.repo.update(id, &draft).await?;
        tracing::info!(book_id = %book.id, "Book updated");
        Ok(book)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> AppResult<Book> {
        let book = self.repo.delete(id).await?.ok_or(AppError::NotFound)?;
        tracing::info!(book_id = %book.id, "Book deleted");
        Ok(book)
    }
}
