//! Tests for database initialization
//!
//! Covers automatic creation of the database file and idempotent schema setup.

use bookclub_common::db::init::init_database;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("nested").join("bookclub.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("bookclub.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    // Second open must not fail on the already-created tables
    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_all_tables_created() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("bookclub.db");
    let pool = init_database(&db_path).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for expected in ["books", "discussions", "meeting_date_votes", "meetings"] {
        assert!(
            tables.iter().any(|t| t == expected),
            "Should have table: {}",
            expected
        );
    }
}
