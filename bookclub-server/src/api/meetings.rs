//! Meeting endpoints
//!
//! Meetings own a discussion (question list) and a set of candidate dates
//! that members vote on.

use crate::db::discussions::load_discussion;
use crate::db::meetings::{
    cast_vote, create_meeting, delete_meeting, list_meetings, list_votes, load_meeting,
    update_meeting, MeetingFields, NewMeeting,
};
use crate::types::BookStore;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookclub_common::db::{BookRecord, Discussion, Meeting, MeetingDateVote};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingFieldsRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub meeting_date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    pub max_participants: i64,
    #[serde(default)]
    pub address: String,
    pub detailed_address: Option<String>,
    #[serde(default)]
    pub recommendation_reason: String,
    pub range: Option<String>,
}

impl MeetingFieldsRequest {
    fn validate(self) -> ApiResult<MeetingFields> {
        if self.title.trim().is_empty() {
            return Err(ApiError::BadRequest("title is required".to_string()));
        }
        if self.meeting_date.trim().is_empty() {
            return Err(ApiError::BadRequest("meetingDate is required".to_string()));
        }
        if self.max_participants < 1 {
            return Err(ApiError::BadRequest(
                "maxParticipants must be at least 1".to_string(),
            ));
        }

        Ok(MeetingFields {
            title: self.title.trim().to_string(),
            description: self.description,
            meeting_date: self.meeting_date,
            start_time: self.start_time,
            end_time: self.end_time,
            max_participants: self.max_participants,
            address: self.address,
            detailed_address: self.detailed_address.filter(|a| !a.trim().is_empty()),
            recommendation_reason: self.recommendation_reason,
            range: self.range.filter(|r| !r.trim().is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    #[serde(flatten)]
    pub fields: MeetingFieldsRequest,
    pub book_id: String,
    #[serde(default)]
    pub questions: Vec<String>,
    pub creator_id: Option<String>,
    #[serde(default)]
    pub date_options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeetingRequest {
    #[serde(flatten)]
    pub fields: MeetingFieldsRequest,
    pub questions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub creator_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub date_id: String,
}

#[derive(Debug, Serialize)]
pub struct MeetingDetail {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub book: Option<BookRecord>,
    pub discussion: Option<Discussion>,
}

#[derive(Debug, Serialize)]
pub struct MeetingsResponse {
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Serialize)]
pub struct VotesResponse {
    pub votes: Vec<MeetingDateVote>,
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

async fn require_meeting(state: &AppState, id: &str) -> ApiResult<Meeting> {
    load_meeting(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("meeting {}", id)))
}

/// POST /api/meetings
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateMeetingRequest>,
) -> ApiResult<(StatusCode, Json<Meeting>)> {
    let fields = request.fields.validate()?;

    if state.books.get(&request.book_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("book {}", request.book_id)));
    }

    let meeting = create_meeting(
        &state.db,
        NewMeeting {
            fields,
            book_id: request.book_id,
            creator_id: request.creator_id.filter(|c| !c.trim().is_empty()),
            questions: clean_list(request.questions),
            date_options: clean_list(request.date_options),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(meeting)))
}

/// GET /api/meetings?creatorId=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<MeetingsResponse>> {
    let meetings = list_meetings(&state.db, params.creator_id.as_deref()).await?;
    Ok(Json(MeetingsResponse { meetings }))
}

/// GET /api/meetings/:id
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MeetingDetail>> {
    let meeting = require_meeting(&state, &id).await?;
    let book = state.books.get(&meeting.book_id).await?;
    let discussion = match &meeting.discussion_id {
        Some(discussion_id) => load_discussion(&state.db, discussion_id).await?,
        None => None,
    };

    Ok(Json(MeetingDetail {
        meeting,
        book,
        discussion,
    }))
}

/// PUT /api/meetings/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMeetingRequest>,
) -> ApiResult<Json<Meeting>> {
    let fields = request.fields.validate()?;
    let questions = request.questions.map(clean_list);

    update_meeting(&state.db, &id, &fields, questions.as_deref())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("meeting {}", id)))
}

/// DELETE /api/meetings/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if delete_meeting(&state.db, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("meeting {}", id)))
    }
}

/// GET /api/meetings/:id/vote
pub async fn votes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VotesResponse>> {
    require_meeting(&state, &id).await?;
    let votes = list_votes(&state.db, &id).await?;
    Ok(Json(VotesResponse { votes }))
}

/// POST /api/meetings/:id/vote
pub async fn vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<Json<MeetingDateVote>> {
    cast_vote(&state.db, &id, &request.date_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("date option {} for meeting {}", request.date_id, id))
        })
}

/// Build meeting routes
pub fn meeting_routes() -> Router<AppState> {
    Router::new()
        .route("/api/meetings", get(list).post(create))
        .route("/api/meetings/:id", get(detail).put(update).delete(remove))
        .route("/api/meetings/:id/vote", get(votes).post(vote))
}
