//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` creates an `AppState` whose ports are in-memory mocks,
//! so routes and the auth middleware can be driven through `axum_test::TestServer`.

use std::sync::Arc;

use crate::{
    adapters::http::app_state::AppState,
    entities::{author::Author, book::Book},
    test_utils::{InMemoryBookRepo, MockTokenRefresher, StubAuthorDirectory, test_config},
    use_cases::{
        auth::{AuthUseCases, TokenRefresher},
        book::{AuthorDirectory, BookRepo, BookUseCases},
    },
};

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let book = create_test_book(|b| b.title = "Dune".to_string());
///
/// let app_state = TestAppStateBuilder::new()
///     .with_books(vec![book])
///     .with_refresher(Arc::new(MockTokenRefresher::returning("fresh")))
///     .build();
/// ```
pub struct TestAppStateBuilder {
    books: Vec<Book>,
    authors: Vec<Author>,
    book_repo: Option<Arc<dyn BookRepo>>,
    author_directory: Option<Arc<dyn AuthorDirectory>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            books: vec![],
            authors: vec![],
            book_repo: None,
            author_directory: None,
            refresher: None,
        }
    }

    /// Seed the default in-memory book repo.
    pub fn with_books(mut self, books: Vec<Book>) -> Self {
        self.books = books;
        self
    }

    /// Seed the default author directory stub.
    pub fn with_authors(mut self, authors: Vec<Author>) -> Self {
        self.authors = authors;
        self
    }

    /// Replace the book repo entirely (seeded books are then ignored).
    pub fn with_book_repo(mut self, repo: Arc<dyn BookRepo>) -> Self {
        self.book_repo = Some(repo);
        self
    }

    /// Replace the author directory entirely (seeded authors are then ignored).
    pub fn with_author_directory(mut self, directory: Arc<dyn AuthorDirectory>) -> Self {
        self.author_directory = Some(directory);
        self
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn build(self) -> AppState {
        let config = test_config();

        let repo = self
            .book_repo
            .unwrap_or_else(|| Arc::new(InMemoryBookRepo::with_books(self.books)));
        let authors = self
            .author_directory
            .unwrap_or_else(|| Arc::new(StubAuthorDirectory::with_authors(self.authors)));
        let refresher = self
            .refresher
            .unwrap_or_else(|| Arc::new(MockTokenRefresher::failing()));

        let auth_use_cases = AuthUseCases::new(
            crate::test_utils::test_secret(),
            config.jwt_leeway_secs,
            refresher,
            config.refresh_timeout,
        );

        AppState {
            config: Arc::new(config),
            auth_use_cases: Arc::new(auth_use_cases),
            book_use_cases: Arc::new(BookUseCases::new(repo, authors)),
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
