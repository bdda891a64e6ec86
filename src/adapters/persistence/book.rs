use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    entities::book::{Book, BookDraft, BookFilter, CoverImage},
    use_cases::book::BookRepo,
};

const SELECT_COLS: &str = r#"
    id, title, author, publish_date, page_count, description,
    cover_image, cover_image_type, created_at
"#;

fn row_to_book(row: sqlx::postgres::PgRow) -> Book {
    let cover_data: Option<Vec<u8>> = row.get("cover_image");
    let cover_image_type: Option<String> = row.get("cover_image_type");
    let cover = match (cover_data, &cover_image_type) {
        (Some(data), Some(mime_type)) => Some(CoverImage {
            data,
            mime_type: mime_type.clone(),
        }),
        _ => None,
    };
    Book {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        publish_date: row.get("publish_date"),
        page_count: row.get("page_count"),
        description: row.get("description"),
        cover,
        cover_image_type,
        created_at: row.get("created_at"),
    }
}

/// Pushes the listing filters. Caller must have pushed `WHERE TRUE` already.
fn push_book_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    if let Some(pattern) = &filter.title_pattern {
        builder.push(" AND title ~* ").push_bind(pattern.clone());
    }
    if let Some(author) = &filter.author {
        builder.push(" AND author = ").push_bind(author.clone());
    }
    if let Some(before) = filter.published_before {
        builder.push(" AND publish_date <= ").push_bind(before);
    }
    if let Some(after) = filter.published_after {
        builder.push(" AND publish_date >= ").push_bind(after);
    }
}

#[async_trait]
impl BookRepo for PostgresPersistence {
    async fn create(&self, draft: &BookDraft) -> AppResult<Book> {
        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            r#"
                INSERT INTO books (id, title, author, publish_date, page_count, description, cover_image, cover_image_type)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {SELECT_COLS}
            "#
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(draft.publish_date)
        .bind(draft.page_count)
        .bind(&draft.description)
        .bind(draft.cover.as_ref().map(|c| c.data.clone()))
        .bind(draft.cover.as_ref().map(|c| c.mime_type.clone()))
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row_to_book(row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLS} FROM books WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(row.map(row_to_book))
    }

    async fn list(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SELECT_COLS} FROM books WHERE TRUE"));
        push_book_filters(&mut builder, filter);
        if filter.newest_first {
            builder.push(" ORDER BY created_at DESC");
        } else {
            builder.push(" ORDER BY created_at ASC");
        }
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }

        let rows = builder
            .build()
            .fetch_all(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_book).collect())
    }

    async fn update(&self, id: Uuid, draft: &BookDraft) -> AppResult<Book> {
        // A NULL cover keeps the stored one.
        let row = sqlx::query(&format!(
            r#"
                UPDATE books
                SET title = $2,
                    author = $3,
                    publish_date = $4,
                    page_count = $5,
                    description = $6,
                    cover_image = COALESCE($7, cover_image),
                    cover_image_type = COALESCE($8, cover_image_type)
                WHERE id = $1
                RETURNING {SELECT_COLS}
            "#
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(draft.publish_date)
        .bind(draft.page_count)
        .bind(&draft.description)
        .bind(draft.cover.as_ref().map(|c| c.data.clone()))
        .bind(draft.cover.as_ref().map(|c| c.mime_type.clone()))
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        row.map(row_to_book).ok_or(AppError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<Book>> {
        let row = sqlx::query(&format!(
            "DELETE FROM books WHERE id = $1 RETURNING {SELECT_COLS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_book))
    }
}
