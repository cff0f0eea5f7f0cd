//! Book endpoints
//!
//! - `POST /api/books/recommend`: run the recommendation pipeline
//! - `GET /api/books`: most recently added books
//! - `GET /api/books/:id`: one stored book
//! - `POST /api/books/by-ids`: several stored books
//! - `GET /api/books/search`: paginated external search (nothing persisted)

use crate::services::recommendation::{RecommendedBook, DEFAULT_COUNT};
use crate::types::{BibliographicRecord, BookStore};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use bookclub_common::db::BookRecord;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Books returned by `GET /api/books`
const RECENT_LIMIT: usize = 10;

/// Largest page the search service accepts
const MAX_SEARCH_LIMIT: u32 = 100;
const DEFAULT_SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub category: String,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub books: Vec<RecommendedBook>,
}

#[derive(Debug, Serialize)]
pub struct BooksResponse {
    pub books: Vec<BookRecord>,
}

#[derive(Debug, Deserialize)]
pub struct BooksByIdsRequest {
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// External search hit with its derived identifier
#[derive(Debug, Serialize)]
pub struct SearchedBook {
    pub id: String,
    #[serde(flatten)]
    pub record: BibliographicRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub books: Vec<SearchedBook>,
    pub total: u64,
    pub has_more: bool,
}

/// POST /api/books/recommend
///
/// **Request:** `{"category": "철학", "count": 5}`
///
/// **Errors:** 400 for a blank category or a count outside 1..=20, 404 when
/// no book could be produced from any source.
pub async fn recommend_books(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> ApiResult<Json<RecommendResponse>> {
    let category = request.category.trim();
    if category.is_empty() {
        return Err(ApiError::BadRequest("category is required".to_string()));
    }

    let count = request.count.unwrap_or(DEFAULT_COUNT);
    info!(category = %category, count, "Recommendation requested");

    let books = state.recommender.recommend(category, count).await?;
    Ok(Json(RecommendResponse { books }))
}

/// GET /api/books
pub async fn list_books(State(state): State<AppState>) -> ApiResult<Json<BooksResponse>> {
    let books = state.books.list_recent(RECENT_LIMIT).await?;
    Ok(Json(BooksResponse { books }))
}

/// GET /api/books/:id
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BookRecord>> {
    state
        .books
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("book {}", id)))
}

/// POST /api/books/by-ids
///
/// Unknown ids are skipped; found books keep the requested order.
pub async fn books_by_ids(
    State(state): State<AppState>,
    Json(request): Json<BooksByIdsRequest>,
) -> ApiResult<Json<BooksResponse>> {
    let ids = request
        .ids
        .ok_or_else(|| ApiError::BadRequest("ids is required".to_string()))?;

    let mut books = state.books.get_many(&ids).await?;
    books.sort_by_key(|b| ids.iter().position(|id| *id == b.id));

    Ok(Json(BooksResponse { books }))
}

/// GET /api/books/search?q=&page=1&limit=10
pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::BadRequest("q is required".to_string()));
    }

    let page = params.page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::BadRequest("page starts at 1".to_string()));
    }

    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    if limit == 0 || limit > MAX_SEARCH_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_SEARCH_LIMIT
        )));
    }

    let start = (page - 1)
        .checked_mul(limit)
        .and_then(|offset| offset.checked_add(1))
        .ok_or_else(|| ApiError::BadRequest("page out of range".to_string()))?;

    let result = state.search.search_paginated(query, start, limit).await?;

    Ok(Json(SearchResponse {
        books: result
            .books
            .into_iter()
            .map(|record| SearchedBook {
                id: record.external_id(),
                record,
            })
            .collect(),
        total: result.total,
        has_more: result.has_more,
    }))
}

/// Build book routes
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/api/books", get(list_books))
        .route("/api/books/recommend", post(recommend_books))
        .route("/api/books/by-ids", post(books_by_ids))
        .route("/api/books/search", get(search_books))
        .route("/api/books/:id", get(get_book))
}
