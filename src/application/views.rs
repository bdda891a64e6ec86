//! Server-rendered HTML pages.

use uuid::Uuid;

use crate::{
    credentials::{ACCESS_TOKEN_PARAM, CredentialPair, REFRESH_TOKEN_PARAM, encode_token},
    entities::{author::Author, book::Book},
    use_cases::book::{BookForm, BookSearch},
};

/// Per-request values every page needs: sibling service URLs and the caller's
/// tokens encoded for cross-service links.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub auth_base_url: String,
    pub author_base_url: String,
    pub books_base_url: String,
    pub encoded_access_token: String,
    pub encoded_refresh_token: Option<String>,
}

impl PageContext {
    pub fn new(
        auth_base_url: &str,
        author_base_url: &str,
        books_base_url: &str,
        credentials: &CredentialPair,
    ) -> Self {
        Self {
            auth_base_url: auth_base_url.trim_end_matches('/').to_string(),
            author_base_url: author_base_url.trim_end_matches('/').to_string(),
            books_base_url: books_base_url.trim_end_matches('/').to_string(),
            encoded_access_token: encode_token(&credentials.access_token),
            encoded_refresh_token: credentials.refresh_token.as_deref().map(encode_token),
        }
    }

    /// Link into the author service that carries the credentials in the query
    /// string, for navigation where our cookies are not sent.
    pub fn author_link(&self, path: &str) -> String {
        let mut link = format!(
            "{}{}?{}={}",
            self.author_base_url, path, ACCESS_TOKEN_PARAM, self.encoded_access_token
        );
        if let Some(refresh) = &self.encoded_refresh_token {
            link.push_str(&format!("&{REFRESH_TOKEN_PARAM}={refresh}"));
        }
        link
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    New,
    Edit(Uuid),
}

pub fn books_index(
    page: &PageContext,
    books: &[Book],
    search: &BookSearch,
    error: Option<&str>,
) -> String {
    let body = format!(
        r#"<h2>Search Books</h2>
<form action="/books" method="GET" class="search">
  <label>Title <input type="text" name="title" value="{title}"></label>
  <label>Published After <input type="date" name="publishedAfter" value="{after}"></label>
  <label>Published Before <input type="date" name="publishedBefore" value="{before}"></label>
  <button type="submit">Search</button>
</form>
{error}{grid}"#,
        title = escape(&search.title),
        after = escape(&search.published_after),
        before = escape(&search.published_before),
        error = error_banner(error),
        grid = book_grid(books),
    );
    layout(page, "Books", &body)
}

pub fn recently_added(page: &PageContext, books: &[Book], error: Option<&str>) -> String {
    let body = format!(
        "<h2>Recently Added</h2>\n{}{}",
        error_banner(error),
        book_grid(books)
    );
    layout(page, "Recently Added", &body)
}

pub fn book_show(
    page: &PageContext,
    book: &Book,
    author: &Author,
    error: Option<&str>,
) -> String {
    let cover = book
        .cover
        .as_ref()
        .map(|c| format!(r#"<img class="cover" src="{}" alt="cover">"#, c.data_uri()))
        .unwrap_or_default();
    let description = book.description.as_deref().map(escape).unwrap_or_default();
    let author_href = page.author_link(&format!("/authors/{}", author.id));
    let body = format!(
        r#"<h2>{title}</h2>
{error}<div class="book-details">
  {cover}
  <dl>
    <dt>Author</dt><dd><a href="{author_href}">{author_name}</a></dd>
    <dt>Publish Date</dt><dd>{publish_date}</dd>
    <dt>Page Count</dt><dd>{page_count}</dd>
    <dt>Description</dt><dd>{description}</dd>
  </dl>
  <a href="/books/{id}/edit">Edit</a>
  <form action="/books/{id}?_method=DELETE" method="POST">
    <button type="submit">Delete</button>
  </form>
</div>"#,
        title = escape(&book.title),
        error = error_banner(error),
        author_href = escape(&author_href),
        author_name = escape(&author.name),
        publish_date = book.publish_date,
        page_count = book.page_count,
        id = book.id,
    );
    layout(page, &book.title, &body)
}

/// Shared by the new and edit pages. `has_error` re-renders with a banner and
/// the submitted values.
pub fn book_form(
    page: &PageContext,
    mode: FormMode,
    form: &BookForm,
    authors: &[Author],
    has_error: bool,
) -> String {
    let (heading, action, error) = match mode {
        FormMode::New => ("New Book", "/books".to_string(), "Error Creating Book"),
        FormMode::Edit(id) => (
            "Edit Book",
            format!("/books/{id}?_method=PUT"),
            "Error Updating Book",
        ),
    };
    let options: String = authors
        .iter()
        .map(|a| {
            let selected = if a.id == form.author { " selected" } else { "" };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                escape(&a.id),
                selected,
                escape(&a.name)
            )
        })
        .collect();
    let body = format!(
        r#"<h2>{heading}</h2>
{error}<form action="{action}" method="POST">
  <label>Title <input type="text" name="title" value="{title}"></label>
  <label>Author <select name="author">{options}</select></label>
  <label>Publish Date <input type="date" name="publishDate" value="{publish_date}"></label>
  <label>Page Count <input type="number" name="pageCount" min="1" value="{page_count}"></label>
  <label>Cover <input type="file" class="filepond" name="cover"></label>
  <label>Description <textarea name="description">{description}</textarea></label>
  <button type="submit">Save</button>
  <a href="/books">Cancel</a>
</form>"#,
        error = error_banner(has_error.then_some(error)),
        action = escape(&action),
        title = escape(&form.title),
        publish_date = escape(&form.publish_date),
        page_count = escape(&form.page_count),
        description = escape(&form.description),
    );
    layout(page, heading, &body)
}

fn book_grid(books: &[Book]) -> String {
    if books.is_empty() {
        return r#"<p class="empty">No books found.</p>"#.to_string();
    }
    let items: String = books
        .iter()
        .map(|book| {
            let cover = book
                .cover
                .as_ref()
                .map(|c| format!(r#"<img class="cover" src="{}" alt="">"#, c.data_uri()))
                .unwrap_or_default();
            format!(
                r#"<li class="book"><a href="/books/{}">{}<span>{}</span></a></li>"#,
                book.id,
                cover,
                escape(&book.title)
            )
        })
        .collect();
    format!(r#"<ul class="book-grid">{items}</ul>"#)
}

fn error_banner(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<div class="error">{}</div>"#, escape(e)))
        .unwrap_or_default()
}

fn layout(page: &PageContext, title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
</head>
<body>
  <nav>
    <a href="{books}/books">Books</a>
    <a href="{books}/books/recentlyAdded">Recently Added</a>
    <a href="{books}/books/new">Add Book</a>
    <a href="{authors}">Authors</a>
  </nav>
  <main>
{body}
  </main>
</body>
</html>"#,
        title = escape(title),
        books = escape(&page.books_base_url),
        authors = escape(&page.author_link("/authors")),
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::decode_token;
    use crate::test_utils::create_test_book;

    fn page() -> PageContext {
        PageContext::new(
            "http://auth.test/",
            "http://authors.test",
            "http://books.test",
            &CredentialPair {
                access_token: "acc.ess+tok/en".into(),
                refresh_token: Some("ref=resh".into()),
            },
        )
    }

    #[test]
    fn author_link_carries_decodable_credentials() {
        let link = page().author_link("/authors");
        let query = link.split_once('?').unwrap().1;
        let params: Vec<(&str, &str)> = query
            .split('&')
            .map(|kv| kv.split_once('=').unwrap())
            .collect();

        assert!(link.starts_with("http://authors.test/authors?"));
        assert_eq!(params[0].0, ACCESS_TOKEN_PARAM);
        assert_eq!(decode_token(params[0].1).unwrap(), "acc.ess+tok/en");
        assert_eq!(params[1].0, REFRESH_TOKEN_PARAM);
        assert_eq!(decode_token(params[1].1).unwrap(), "ref=resh");
    }

    #[test]
    fn titles_are_escaped() {
        let book = create_test_book(|b| b.title = "<script>alert(1)</script>".into());
        let html = books_index(&page(), &[book], &BookSearch::default(), None);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn edit_form_with_error_keeps_input() {
        let form = BookForm {
            title: "Half typed".into(),
            author: "a-2".into(),
            ..Default::default()
        };
        let authors = vec![
            Author { id: "a-1".into(), name: "First".into() },
            Author { id: "a-2".into(), name: "Second".into() },
        ];
        let id = Uuid::new_v4();
        let html = book_form(&page(), FormMode::Edit(id), &form, &authors, true);

        assert!(html.contains("Error Updating Book"));
        assert!(html.contains(r#"value="Half typed""#));
        assert!(html.contains(r#"<option value="a-2" selected>Second</option>"#));
        assert!(html.contains(&format!("/books/{id}?_method=PUT")));
    }
}
