//! Discussion persistence
//!
//! Questions are stored as a JSON array in a TEXT column.

use bookclub_common::db::Discussion;
use bookclub_common::uuid_utils::generate_id;
use bookclub_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};

pub(crate) fn discussion_from_row(row: &SqliteRow) -> Result<Discussion> {
    let questions_json: String = row.try_get("questions")?;

    Ok(Discussion {
        id: row.try_get("id")?,
        book_id: row.try_get("book_id")?,
        questions: serde_json::from_str(&questions_json)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Insert a discussion inside an open transaction or on a pool connection
pub(crate) async fn insert_discussion<'e, E>(
    executor: E,
    book_id: &str,
    questions: &[String],
) -> Result<String>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let id = generate_id();

    sqlx::query("INSERT INTO discussions (id, book_id, questions) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(book_id)
        .bind(serde_json::to_string(questions)?)
        .execute(executor)
        .await?;

    Ok(id)
}

/// Save a new discussion for `book_id`
pub async fn create_discussion(
    pool: &SqlitePool,
    book_id: &str,
    questions: &[String],
) -> Result<Discussion> {
    let id = insert_discussion(pool, book_id, questions).await?;

    load_discussion(pool, &id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Discussion {} missing after insert", id)))
}

/// Load discussion by id
pub async fn load_discussion(pool: &SqlitePool, id: &str) -> Result<Option<Discussion>> {
    let row = sqlx::query(
        "SELECT id, book_id, questions, created_at, updated_at FROM discussions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(discussion_from_row).transpose()
}

/// Replace the question list
pub(crate) async fn update_questions<'e, E>(executor: E, id: &str, questions: &[String]) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE discussions SET questions = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(serde_json::to_string(questions)?)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(())
}
