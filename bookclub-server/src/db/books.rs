//! Book persistence
//!
//! `SqliteBookStore` implements `BookStore` over the shared `books` table.
//! Containment predicates use `instr()` so matching stays case-sensitive
//! (SQLite `LIKE` folds ASCII case).

use crate::types::{BookOrder, BookQuery, BookStore, BookUpdate, NewBook};
use async_trait::async_trait;
use bookclub_common::db::BookRecord;
use bookclub_common::uuid_utils::generate_id;
use bookclub_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const BOOK_COLUMNS: &str = "id, title, author, description, isbn, category, image_url, link, \
     publisher, price, pub_date, recommendation_reason, created_at, updated_at";

/// SQLite-backed book store
#[derive(Clone)]
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recently created books
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<BookRecord>> {
        self.find_many(&BookQuery::new(), limit, BookOrder::NewestFirst)
            .await
    }
}

pub(crate) fn book_from_row(row: &SqliteRow) -> Result<BookRecord> {
    Ok(BookRecord {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        description: row.try_get("description")?,
        isbn: row.try_get("isbn")?,
        category: row.try_get("category")?,
        image_url: row.try_get("image_url")?,
        link: row.try_get("link")?,
        publisher: row.try_get("publisher")?,
        price: row.try_get("price")?,
        pub_date: row.try_get("pub_date")?,
        recommendation_reason: row.try_get("recommendation_reason")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Append `WHERE` conditions for `query`
fn push_conditions(builder: &mut QueryBuilder<'_, Sqlite>, query: &BookQuery) {
    builder.push(" WHERE 1 = 1");

    if let Some(title) = &query.title_contains {
        builder
            .push(" AND instr(title, ")
            .push_bind(title.clone())
            .push(") > 0");
    }

    if let Some(author) = &query.author_contains {
        builder
            .push(" AND instr(author, ")
            .push_bind(author.clone())
            .push(") > 0");
    }

    if let Some(category) = &query.category {
        builder.push(" AND category = ").push_bind(category.clone());
    }

    if let Some(isbn) = &query.isbn {
        builder.push(" AND isbn = ").push_bind(isbn.clone());
    }

    if !query.exclude_ids.is_empty() {
        builder.push(" AND id NOT IN (");
        let mut separated = builder.separated(", ");
        for id in &query.exclude_ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");
    }
}

fn order_clause(order: BookOrder) -> &'static str {
    match order {
        BookOrder::NewestFirst => " ORDER BY created_at DESC, rowid DESC",
        BookOrder::OldestFirst => " ORDER BY created_at ASC, rowid ASC",
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn get(&self, id: &str) -> Result<Option<BookRecord>> {
        let row = sqlx::query(&format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(book_from_row).transpose()
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<BookRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM books WHERE id IN (",
            BOOK_COLUMNS
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");
        builder.push(order_clause(BookOrder::OldestFirst));

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(book_from_row).collect()
    }

    async fn find_first(&self, query: &BookQuery) -> Result<Option<BookRecord>> {
        let mut books = self.find_many(query, 1, BookOrder::OldestFirst).await?;
        Ok(books.pop())
    }

    async fn find_many(
        &self,
        query: &BookQuery,
        limit: usize,
        order: BookOrder,
    ) -> Result<Vec<BookRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM books", BOOK_COLUMNS));
        push_conditions(&mut builder, query);
        builder.push(order_clause(order));
        builder.push(" LIMIT ").push_bind(limit as i64);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(book_from_row).collect()
    }

    async fn create(&self, book: NewBook) -> Result<BookRecord> {
        let id = generate_id();

        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, author, description, isbn, category, image_url, link,
                publisher, price, pub_date, recommendation_reason
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(&book.image_url)
        .bind(&book.link)
        .bind(&book.publisher)
        .bind(book.price)
        .bind(&book.pub_date)
        .bind(&book.recommendation_reason)
        .execute(&self.pool)
        .await?;

        tracing::debug!(book_id = %id, title = %book.title, "Created book record");

        self.get(&id)
            .await?
            .ok_or_else(|| Error::Internal(format!("Book {} missing after insert", id)))
    }

    async fn update(&self, id: &str, changes: BookUpdate) -> Result<BookRecord> {
        let result = sqlx::query(
            r#"
            UPDATE books SET
                category = COALESCE(?, category),
                recommendation_reason = COALESCE(?, recommendation_reason),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(&changes.category)
        .bind(&changes.recommendation_reason)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("book {}", id)));
        }

        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("book {}", id)))
    }
}
