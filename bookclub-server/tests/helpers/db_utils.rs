//! Database Test Utilities

use bookclub_common::db::BookRecord;
use bookclub_server::db::SqliteBookStore;
use bookclub_server::types::{BookStore, NewBook};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// In-memory database with the full schema
///
/// Single connection: each connection to `sqlite::memory:` is its own database.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    bookclub_common::db::create_schema(&pool)
        .await
        .expect("Failed to create schema");

    pool
}

/// Insert one book directly through the store
pub async fn seed_book(
    store: &SqliteBookStore,
    title: &str,
    author: &str,
    category: &str,
) -> BookRecord {
    store
        .create(NewBook {
            title: title.to_string(),
            author: author.to_string(),
            category: category.to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to seed book")
}

/// Count rows in `books`
pub async fn count_books(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(pool)
        .await
        .expect("Failed to count books")
}
