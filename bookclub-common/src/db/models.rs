//! Database models
//!
//! Serialized with camelCase field names, the shape the web front end reads.

use serde::{Deserialize, Serialize};

/// Canonical book entity, the unit of deduplication
///
/// `author` is stored in comma-delimited form (`"Kim, Lee"`), never with the
/// caret separator used by upstream services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub category: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub publisher: Option<String>,
    pub price: Option<i64>,
    pub pub_date: Option<String>,
    pub recommendation_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Generated discussion questions attached to a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub id: String,
    pub book_id: String,
    pub questions: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Scheduled book club meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
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
    pub image_url: Option<String>,
    pub book_id: String,
    pub creator_id: Option<String>,
    pub discussion_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Candidate meeting date and its vote tally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDateVote {
    pub id: String,
    pub meeting_id: String,
    pub date: String,
    pub votes: i64,
}
