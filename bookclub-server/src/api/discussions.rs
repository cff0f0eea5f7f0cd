//! Discussion endpoints

use crate::db::discussions::{create_discussion, load_discussion};
use crate::services::discussion::{generate_questions, DEFAULT_QUESTION_COUNT};
use crate::types::BookStore;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bookclub_common::db::{BookRecord, Discussion};
use serde::{Deserialize, Serialize};

/// Upper bound on generated questions per request
const MAX_QUESTION_COUNT: usize = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub book_id: Option<String>,
    pub question_count: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDiscussion {
    pub questions: Vec<String>,
    pub book_id: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub discussion: GeneratedDiscussion,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscussionRequest {
    pub book_id: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DiscussionWithBook {
    #[serde(flatten)]
    pub discussion: Discussion,
    pub book: Option<BookRecord>,
}

async fn require_book(state: &AppState, book_id: &str) -> ApiResult<BookRecord> {
    state
        .books
        .get(book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book {}", book_id)))
}

/// POST /api/discussions/generate
///
/// Generates questions for a stored book without saving them.
pub async fn generate_discussion(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let book_id = request
        .book_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("bookId is required".to_string()))?;

    let count = request.question_count.unwrap_or(DEFAULT_QUESTION_COUNT);
    if count == 0 || count > MAX_QUESTION_COUNT {
        return Err(ApiError::BadRequest(format!(
            "questionCount must be between 1 and {}",
            MAX_QUESTION_COUNT
        )));
    }

    let book = require_book(&state, &book_id).await?;
    let questions = generate_questions(state.generator.as_ref(), &book, count).await?;

    tracing::info!(book_id = %book_id, questions = questions.len(), "Generated discussion questions");

    Ok(Json(GenerateResponse {
        discussion: GeneratedDiscussion { questions, book_id },
    }))
}

/// POST /api/discussions
pub async fn save_discussion(
    State(state): State<AppState>,
    Json(request): Json<CreateDiscussionRequest>,
) -> ApiResult<(StatusCode, Json<Discussion>)> {
    let questions: Vec<String> = request
        .questions
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();
    if questions.is_empty() {
        return Err(ApiError::BadRequest("questions must not be empty".to_string()));
    }

    require_book(&state, &request.book_id).await?;
    let discussion = create_discussion(&state.db, &request.book_id, &questions).await?;

    Ok((StatusCode::CREATED, Json(discussion)))
}

/// GET /api/discussions/:id
pub async fn get_discussion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DiscussionWithBook>> {
    let discussion = load_discussion(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("discussion {}", id)))?;
    let book = state.books.get(&discussion.book_id).await?;

    Ok(Json(DiscussionWithBook { discussion, book }))
}

/// Build discussion routes
pub fn discussion_routes() -> Router<AppState> {
    Router::new()
        .route("/api/discussions", post(save_discussion))
        .route("/api/discussions/generate", post(generate_discussion))
        .route("/api/discussions/:id", get(get_discussion))
}
