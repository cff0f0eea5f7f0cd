//! Meeting persistence
//!
//! A meeting owns its discussion and its candidate-date votes. Creation and
//! deletion touch all three tables in one transaction.

use crate::db::discussions::{insert_discussion, update_questions};
use bookclub_common::db::{Meeting, MeetingDateVote};
use bookclub_common::uuid_utils::generate_id;
use bookclub_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const MEETING_COLUMNS: &str = "id, title, description, meeting_date, start_time, end_time, \
     max_participants, address, detailed_address, recommendation_reason, reading_range, image_url, \
     book_id, creator_id, discussion_id, created_at, updated_at";

/// Editable meeting fields
#[derive(Debug, Clone, Default)]
pub struct MeetingFields {
    pub title: String,
    pub description: String,
    pub meeting_date: String,
    pub start_time: String,
    pub end_time: String,
    pub max_participants: i64,
    pub address: String,
    pub detailed_address: Option<String>,
    pub recommendation_reason: String,
    pub range: Option<String>,
}

/// Everything needed to create a meeting
#[derive(Debug, Clone, Default)]
pub struct NewMeeting {
    pub fields: MeetingFields,
    pub book_id: String,
    pub creator_id: Option<String>,
    pub questions: Vec<String>,
    pub date_options: Vec<String>,
}

fn meeting_from_row(row: &SqliteRow) -> Result<Meeting> {
    Ok(Meeting {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        meeting_date: row.try_get("meeting_date")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        max_participants: row.try_get("max_participants")?,
        address: row.try_get("address")?,
        detailed_address: row.try_get("detailed_address")?,
        recommendation_reason: row.try_get("recommendation_reason")?,
        range: row.try_get("reading_range")?,
        image_url: row.try_get("image_url")?,
        book_id: row.try_get("book_id")?,
        creator_id: row.try_get("creator_id")?,
        discussion_id: row.try_get("discussion_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn vote_from_row(row: &SqliteRow) -> Result<MeetingDateVote> {
    Ok(MeetingDateVote {
        id: row.try_get("id")?,
        meeting_id: row.try_get("meeting_id")?,
        date: row.try_get("date")?,
        votes: row.try_get("votes")?,
    })
}

/// Create discussion, meeting and date votes atomically
pub async fn create_meeting(pool: &SqlitePool, new: NewMeeting) -> Result<Meeting> {
    let mut tx = pool.begin().await?;

    let discussion_id = insert_discussion(&mut *tx, &new.book_id, &new.questions).await?;

    let id = generate_id();
    let f = &new.fields;
    sqlx::query(
        r#"
        INSERT INTO meetings (
            id, title, description, meeting_date, start_time, end_time, max_participants,
            address, detailed_address, recommendation_reason, reading_range, book_id, creator_id,
            discussion_id
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&f.title)
    .bind(&f.description)
    .bind(&f.meeting_date)
    .bind(&f.start_time)
    .bind(&f.end_time)
    .bind(f.max_participants)
    .bind(&f.address)
    .bind(&f.detailed_address)
    .bind(&f.recommendation_reason)
    .bind(&f.range)
    .bind(&new.book_id)
    .bind(&new.creator_id)
    .bind(&discussion_id)
    .execute(&mut *tx)
    .await?;

    for date in &new.date_options {
        sqlx::query("INSERT INTO meeting_date_votes (id, meeting_id, date, votes) VALUES (?, ?, ?, 0)")
            .bind(generate_id())
            .bind(&id)
            .bind(date)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(meeting_id = %id, book_id = %new.book_id, "Created meeting");

    load_meeting(pool, &id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Meeting {} missing after insert", id)))
}

/// Load meeting by id
pub async fn load_meeting(pool: &SqlitePool, id: &str) -> Result<Option<Meeting>> {
    let row = sqlx::query(&format!("SELECT {} FROM meetings WHERE id = ?", MEETING_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(meeting_from_row).transpose()
}

/// Meetings ordered by meeting date, latest first
pub async fn list_meetings(pool: &SqlitePool, creator_id: Option<&str>) -> Result<Vec<Meeting>> {
    let rows = match creator_id {
        Some(creator) => {
            sqlx::query(&format!(
                "SELECT {} FROM meetings WHERE creator_id = ? ORDER BY meeting_date DESC",
                MEETING_COLUMNS
            ))
            .bind(creator)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM meetings ORDER BY meeting_date DESC",
                MEETING_COLUMNS
            ))
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(meeting_from_row).collect()
}

/// Update meeting fields and, if linked, the discussion questions
///
/// Returns `None` when the meeting does not exist.
pub async fn update_meeting(
    pool: &SqlitePool,
    id: &str,
    fields: &MeetingFields,
    questions: Option<&[String]>,
) -> Result<Option<Meeting>> {
    let Some(existing) = load_meeting(pool, id).await? else {
        return Ok(None);
    };

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE meetings SET
            title = ?, description = ?, meeting_date = ?, start_time = ?, end_time = ?,
            max_participants = ?, address = ?, detailed_address = ?,
            recommendation_reason = ?, reading_range = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.meeting_date)
    .bind(&fields.start_time)
    .bind(&fields.end_time)
    .bind(fields.max_participants)
    .bind(&fields.address)
    .bind(&fields.detailed_address)
    .bind(&fields.recommendation_reason)
    .bind(&fields.range)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if let (Some(discussion_id), Some(questions)) = (&existing.discussion_id, questions) {
        update_questions(&mut *tx, discussion_id, questions).await?;
    }

    tx.commit().await?;

    load_meeting(pool, id).await
}

/// Delete meeting with its votes and discussion
///
/// Returns `false` when the meeting does not exist.
pub async fn delete_meeting(pool: &SqlitePool, id: &str) -> Result<bool> {
    let Some(existing) = load_meeting(pool, id).await? else {
        return Ok(false);
    };

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM meeting_date_votes WHERE meeting_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM meetings WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    // Discussion goes last: the meeting row references it
    if let Some(discussion_id) = &existing.discussion_id {
        sqlx::query("DELETE FROM discussions WHERE id = ?")
            .bind(discussion_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(meeting_id = %id, "Deleted meeting");

    Ok(true)
}

/// Date votes for a meeting, most votes first
pub async fn list_votes(pool: &SqlitePool, meeting_id: &str) -> Result<Vec<MeetingDateVote>> {
    let rows = sqlx::query(
        "SELECT id, meeting_id, date, votes FROM meeting_date_votes \
         WHERE meeting_id = ? ORDER BY votes DESC, date ASC",
    )
    .bind(meeting_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(vote_from_row).collect()
}

/// Add one vote to a date option of `meeting_id`
///
/// Returns `None` when no such option belongs to the meeting.
pub async fn cast_vote(
    pool: &SqlitePool,
    meeting_id: &str,
    date_id: &str,
) -> Result<Option<MeetingDateVote>> {
    let result = sqlx::query(
        "UPDATE meeting_date_votes SET votes = votes + 1 WHERE id = ? AND meeting_id = ?",
    )
    .bind(date_id)
    .bind(meeting_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query("SELECT id, meeting_id, date, votes FROM meeting_date_votes WHERE id = ?")
        .bind(date_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(vote_from_row).transpose()
}
