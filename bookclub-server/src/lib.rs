//! bookclub-server library interface
//!
//! Exposes the router, state and services for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use crate::db::SqliteBookStore;
use crate::services::Recommender;
use crate::types::{BookSearch, Generator};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Book records over `db`
    pub books: SqliteBookStore,
    /// Text generation service
    pub generator: Arc<dyn Generator>,
    /// Bibliographic search service
    pub search: Arc<dyn BookSearch>,
    /// Recommendation pipeline over the three collaborators above
    pub recommender: Arc<Recommender>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, generator: Arc<dyn Generator>, search: Arc<dyn BookSearch>) -> Self {
        let books = SqliteBookStore::new(db.clone());
        let recommender = Recommender::new(
            Arc::clone(&generator),
            Arc::clone(&search),
            Arc::new(books.clone()),
        );

        Self {
            db,
            books,
            generator,
            search,
            recommender: Arc::new(recommender),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::book_routes())
        .merge(api::discussion_routes())
        .merge(api::meeting_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
