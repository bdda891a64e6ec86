//! In-memory implementations of the book store and the outbound service ports.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    entities::{
        author::Author,
        book::{Book, BookDraft, BookFilter},
    },
    use_cases::{
        auth::TokenRefresher,
        book::{AuthorDirectory, BookRepo},
    },
};

// ============================================================================
// InMemoryBookRepo
// ============================================================================

/// In-memory implementation of BookRepo for testing.
#[derive(Default)]
pub struct InMemoryBookRepo {
    pub books: Mutex<Vec<Book>>,
    fail: bool,
}

impl InMemoryBookRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            books: Mutex::new(books),
            fail: false,
        }
    }

    /// Every call fails with a database error.
    pub fn failing() -> Self {
        Self {
            books: Mutex::new(vec![]),
            fail: true,
        }
    }

    fn check(&self) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Database("connection refused".into()));
        }
        Ok(())
    }
}

fn matches(book: &Book, filter: &BookFilter) -> bool {
    let title_ok = filter
        .title_pattern
        .as_ref()
        .is_none_or(|p| book.title.to_lowercase().contains(&p.to_lowercase()));
    let author_ok = filter.author.as_ref().is_none_or(|a| &book.author == a);
    let before_ok = filter
        .published_before
        .is_none_or(|d| book.publish_date <= d);
    let after_ok = filter.published_after.is_none_or(|d| book.publish_date >= d);
    title_ok && author_ok && before_ok && after_ok
}

#[async_trait]
impl BookRepo for InMemoryBookRepo {
    async fn create(&self, draft: &BookDraft) -> AppResult<Book> {
        self.check()?;
        let book = Book {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            author: draft.author.clone(),
            publish_date: draft.publish_date,
            page_count: draft.page_count,
            description: draft.description.clone(),
            cover_image_type: draft.cover.as_ref().map(|c| c.mime_type.clone()),
            cover: draft.cover.clone(),
            created_at: Utc::now().naive_utc(),
        };
        self.books.lock().unwrap().push(book.clone());
        Ok(book)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        self.check()?;
        Ok(self.books.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn list(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        self.check()?;
        let mut found: Vec<Book> = self
            .books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| matches(b, filter))
            .cloned()
            .collect();
        if filter.newest_first {
            found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        if let Some(limit) = filter.limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }

    async fn update(&self, id: Uuid, draft: &BookDraft) -> AppResult<Book> {
        self.check()?;
        let mut books = self.books.lock().unwrap();
        let book = books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(AppError::NotFound)?;
        book.title = draft.title.clone();
        book.author = draft.author.clone();
        book.publish_date = draft.publish_date;
        book.page_count = draft.page_count;
        book.description = draft.description.clone();
        if let Some(cover) = &draft.cover {
            book.cover_image_type = Some(cover.mime_type.clone());
            book.cover = Some(cover.clone());
        }
        Ok(book.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<Book>> {
        self.check()?;
        let mut books = self.books.lock().unwrap();
        let idx = books.iter().position(|b| b.id == id);
        Ok(idx.map(|i| books.remove(i)))
    }
}

// ============================================================================
// StubAuthorDirectory
// ============================================================================

/// Fixed set of authors; records the access token of every call.
#[derive(Default)]
pub struct StubAuthorDirectory {
    authors: Vec<Author>,
    fail: bool,
    pub tokens: Mutex<Vec<String>>,
}

impl StubAuthorDirectory {
    pub fn with_authors(authors: Vec<Author>) -> Self {
        Self {
            authors,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    fn record(&self, access_token: &str) -> AppResult<()> {
        self.tokens.lock().unwrap().push(access_token.to_string());
        if self.fail {
            return Err(AppError::Upstream("author service unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthorDirectory for StubAuthorDirectory {
    async fn get_by_id(&self, author_id: &str, access_token: &str) -> AppResult<Author> {
        self.record(access_token)?;
        self.authors
            .iter()
            .find(|a| a.id == author_id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn list_all(&self, access_token: &str) -> AppResult<Vec<Author>> {
        self.record(access_token)?;
        Ok(self.authors.clone())
    }
}

// ============================================================================
// MockTokenRefresher
// ============================================================================

/// Scripted refresh endpoint that records the refresh tokens it was given.
pub struct MockTokenRefresher {
    response: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockTokenRefresher {
    pub fn returning(token: &str) -> Self {
        Self {
            response: Some(token.to_string()),
            delay: None,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            delay: None,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TokenRefresher for MockTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        self.calls.lock().unwrap().push(refresh_token.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response
            .clone()
            .ok_or_else(|| AppError::Upstream("refresh rejected".into()))
    }
}
