use std::sync::Arc;

use axum::{
    Extension, Form, Json, Router,
    extract::{Path, Query, State, rejection::FormRejection},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, auth_cookies::found},
    app_error::AppError,
    entities::book::Book,
    use_cases::{
        auth::AuthSession,
        book::{BookForm, BookSearch, BookUseCases},
    },
    views::{self, FormMode, PageContext},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/recentlyAdded", get(recently_added))
        .route("/getByAuthorId", get(by_author))
        .route("/new", get(new_form))
        .route(
            "/{id}",
            get(show).put(update).delete(delete).post(method_override),
        )
        .route("/{id}/edit", get(edit_form))
}

fn page_context(app_state: &AppState, session: &AuthSession) -> PageContext {
    let config = &app_state.config;
    PageContext::new(
        &config.auth_base_url,
        &config.author_base_url,
        &config.books_base_url,
        &session.credentials(),
    )
}

/// Unparseable ids are treated like unknown ones.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

async fn index(
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(search): Query<BookSearch>,
) -> Html<String> {
    let page = page_context(&app_state, &session);
    match app_state.book_use_cases.search(&search).await {
        Ok(books) => Html(views::books_index(&page, &books, &search, None)),
        Err(err) => {
            tracing::error!(error = %err, "Failed to list books");
            let message = match err {
                AppError::InvalidInput(message) => message,
                _ => "Could not load books".to_string(),
            };
            Html(views::books_index(&page, &[], &search, Some(&message)))
        }
    }
}

async fn recently_added(
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Html<String> {
    let page = page_context(&app_state, &session);
    match app_state.book_use_cases.recently_added().await {
        Ok(books) => Html(views::recently_added(&page, &books, None)),
        Err(err) => {
            tracing::error!(error = %err, "Failed to load recently added books");
            Html(views::recently_added(&page, &[], Some("Could not load books")))
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthorQuery {
    id: Option<String>,
}

/// JSON for the author service's author page; any failure is an empty list.
async fn by_author(
    State(book_use_cases): State<Arc<BookUseCases>>,
    Query(query): Query<AuthorQuery>,
) -> Json<Vec<Book>> {
    let Some(author_id) = query.id.filter(|id| !id.is_empty()) else {
        return Json(vec![]);
    };
    let books = book_use_cases
        .by_author(&author_id)
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, %author_id, "Failed to load books by author");
            vec![]
        });
    Json(books)
}

async fn new_form(
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Response {
    let page = page_context(&app_state, &session);
    match app_state.book_use_cases.authors(&session.access_token).await {
        Ok(authors) => Html(views::book_form(
            &page,
            FormMode::New,
            &BookForm::default(),
            &authors,
            false,
        ))
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to load authors for new book form");
            found("/books")
        }
    }
}

async fn create(
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Form(form): Form<BookForm>,
) -> Response {
    match app_state.book_use_cases.create(&form).await {
        Ok(book) => found(&format!("/books/{}", book.id)),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to create book");
            render_form_with_error(&app_state, &session, FormMode::New, &form).await
        }
    }
}

async fn show(
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return found("/books");
    };
    let page = page_context(&app_state, &session);
    match app_state
        .book_use_cases
        .details(id, &session.access_token)
        .await
    {
        Ok(details) => {
            Html(views::book_show(&page, &details.book, &details.author, None)).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, book_id = %id, "Failed to load book details");
            found("/books")
        }
    }
}

async fn edit_form(
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return found("/books");
    };
    let use_cases = &app_state.book_use_cases;
    let loaded = async {
        let book = use_cases.get(id).await?;
        let authors = use_cases.authors(&session.access_token).await?;
        Ok::<_, AppError>((book, authors))
    }
    .await;

    match loaded {
        Ok((book, authors)) => {
            let page = page_context(&app_state, &session);
            let form = BookForm::from_book(&book);
            Html(views::book_form(
                &page,
                FormMode::Edit(id),
                &form,
                &authors,
                false,
            ))
            .into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, book_id = %id, "Failed to load book for editing");
            found("/books")
        }
    }
}

async fn update(
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    Form(form): Form<BookForm>,
) -> Response {
    apply_update(&app_state, &session, &id, &form).await
}

async fn delete(
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
) -> Response {
    apply_delete(&app_state, &session, &id).await
}

#[derive(Debug, Deserialize)]
struct MethodOverride {
    #[serde(rename = "_method")]
    method: Option<String>,
}

/// HTML forms can only POST; `?_method=PUT|DELETE` selects the real verb.
async fn method_override(
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    Query(query): Query<MethodOverride>,
    form: Result<Form<BookForm>, FormRejection>,
) -> Result<Response, AppError> {
    let method = query.method.unwrap_or_default().to_ascii_uppercase();
    match method.as_str() {
        "PUT" => match form {
            Ok(Form(form)) => Ok(apply_update(&app_state, &session, &id, &form).await),
            Err(rejection) => Ok(rejection.into_response()),
        },
        "DELETE" => Ok(apply_delete(&app_state, &session, &id).await),
        other => Err(AppError::InvalidInput(format!(
            "Unsupported method override: {other:?}"
        ))),
    }
}

async fn apply_update(
    app_state: &AppState,
    session: &AuthSession,
    id: &str,
    form: &BookForm,
) -> Response {
    let Some(id) = parse_id(id) else {
        return found("/books");
    };
    match app_state.book_use_cases.update(id, form).await {
        Ok(book) => found(&format!("/books/{}", book.id)),
        Err(AppError::NotFound) => {
            tracing::warn!(book_id = %id, "Update for a book that no longer exists");
            found("/books")
        }
        Err(err) => {
            tracing::warn!(error = %err, book_id = %id, "Failed to update book");
            render_form_with_error(app_state, session, FormMode::Edit(id), form).await
        }
    }
}

async fn apply_delete(app_state: &AppState, session: &AuthSession, id: &str) -> Response {
    let Some(id) = parse_id(id) else {
        return found("/books");
    };
    match app_state.book_use_cases.delete(id).await {
        Ok(_) => found("/books"),
        Err(AppError::NotFound) => {
            tracing::warn!(book_id = %id, "Delete for a book that does not exist");
            found("/books")
        }
        Err(err) => {
            tracing::error!(error = %err, book_id = %id, "Failed to delete book");
            let search = BookSearch::default();
            let books = app_state
                .book_use_cases
                .search(&search)
                .await
                .unwrap_or_default();
            let page = page_context(app_state, session);
            Html(views::books_index(
                &page,
                &books,
                &search,
                Some("Could not remove book"),
            ))
            .into_response()
        }
    }
}

/// Re-renders the new/edit form with the submitted values and an error banner.
async fn render_form_with_error(
    app_state: &AppState,
    session: &AuthSession,
    mode: FormMode,
    form: &BookForm,
) -> Response {
    let authors = app_state
        .book_use_cases
        .authors(&session.access_token)
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "Failed to load authors for form re-render");
            vec![]
        });
    let page = page_context(app_state, session);
    Html(views::book_form(&page, mode, form, &authors, true)).into_response()
}
