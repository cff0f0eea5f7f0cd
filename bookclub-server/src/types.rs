//! Capability traits and shared types
//!
//! The recommendation pipeline talks to three external collaborators, each
//! behind a trait so the pipeline's control flow is plain branching on
//! returned values:
//! - **Generator:** free-text generation (prompt in, unstructured text out)
//! - **BookSearch:** external bibliographic search
//! - **BookStore:** persisted book records
//!
//! Production implementations live in `services::openai_client`,
//! `services::naver_client` and `db::books`. Tests substitute fakes.

use async_trait::async_trait;
use bookclub_common::db::BookRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Generator
// ============================================================================

/// Text generation errors
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Generator not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Service answered but produced no text
    #[error("Empty response from generator")]
    EmptyResponse,
}

/// Free-text generation service
#[async_trait]
pub trait Generator: Send + Sync {
    /// Ask for `count` book suggestions in `category`
    ///
    /// Output follows the `제목:` / `저자:` / `추천 이유:` labelled-line format
    /// with `---` separator lines, but is not guaranteed to.
    async fn generate_recommendations(
        &self,
        category: &str,
        count: usize,
    ) -> Result<String, GeneratorError>;

    /// Ask for `count` numbered discussion questions about a book
    async fn generate_discussion_questions(
        &self,
        title: &str,
        description: &str,
        count: usize,
    ) -> Result<String, GeneratorError>;
}

// ============================================================================
// Bibliographic search
// ============================================================================

/// Bibliographic fields returned by the external search service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BibliographicRecord {
    pub title: String,
    pub author: String,
    pub description: String,
    pub isbn: String,
    pub link: String,
    pub image_url: String,
    pub publisher: String,
    pub price: i64,
    /// `YYYY-MM-DD`, absent when upstream sent nothing parseable
    pub pub_date: Option<String>,
}

impl BibliographicRecord {
    /// Stable identifier for search results that are not persisted
    pub fn external_id(&self) -> String {
        format!("naver_{}", self.isbn)
    }
}

/// One page of free-text search results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub books: Vec<BibliographicRecord>,
    pub total: u64,
    pub has_more: bool,
}

/// Search service errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// External bibliographic search service
#[async_trait]
pub trait BookSearch: Send + Sync {
    /// Look up a single book by title and author
    ///
    /// `Ok(None)` means the service answered but found nothing.
    async fn search(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Option<BibliographicRecord>, SearchError>;

    /// Free-text search; `start` is 1-based
    async fn search_paginated(
        &self,
        query: &str,
        start: u32,
        display: u32,
    ) -> Result<SearchPage, SearchError>;
}

// ============================================================================
// Book store
// ============================================================================

/// Predicate over persisted books
///
/// All populated conditions must hold. Containment is case-sensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookQuery {
    pub title_contains: Option<String>,
    pub author_contains: Option<String>,
    pub category: Option<String>,
    /// Exact ISBN match
    pub isbn: Option<String>,
    pub exclude_ids: Vec<String>,
}

impl BookQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title_contains(mut self, title: impl Into<String>) -> Self {
        self.title_contains = Some(title.into());
        self
    }

    pub fn author_contains(mut self, author: impl Into<String>) -> Self {
        self.author_contains = Some(author.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    /// Evaluate the predicate in memory
    ///
    /// Store implementations must select exactly the records this accepts.
    pub fn matches(&self, book: &BookRecord) -> bool {
        self.title_contains
            .as_deref()
            .map_or(true, |t| book.title.contains(t))
            && self
                .author_contains
                .as_deref()
                .map_or(true, |a| book.author.contains(a))
            && self.category.as_deref().map_or(true, |c| book.category == c)
            && self
                .isbn
                .as_deref()
                .map_or(true, |i| book.isbn.as_deref() == Some(i))
            && !self.exclude_ids.iter().any(|id| id == &book.id)
    }
}

/// Result ordering for `find_many`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOrder {
    /// Most recently created first
    NewestFirst,
    /// Insertion order
    OldestFirst,
}

/// Fields for a book about to be persisted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewBook {
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
}

impl NewBook {
    /// Build from a search hit, normalizing the author separator
    pub fn from_bibliographic(
        record: BibliographicRecord,
        category: Option<&str>,
        recommendation_reason: Option<&str>,
    ) -> Self {
        Self {
            title: record.title,
            author: normalize_author(&record.author),
            description: Some(record.description),
            isbn: Some(record.isbn).filter(|s| !s.is_empty()),
            category: category.unwrap_or_default().to_string(),
            image_url: Some(record.image_url).filter(|s| !s.is_empty()),
            link: Some(record.link).filter(|s| !s.is_empty()),
            publisher: Some(record.publisher).filter(|s| !s.is_empty()),
            price: Some(record.price),
            pub_date: record.pub_date,
            recommendation_reason: recommendation_reason.map(str::to_string),
        }
    }
}

/// Partial update of a persisted book
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookUpdate {
    pub category: Option<String>,
    pub recommendation_reason: Option<String>,
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.recommendation_reason.is_none()
    }
}

/// Persisted book records
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn get(&self, id: &str) -> bookclub_common::Result<Option<BookRecord>>;

    /// Books with any of `ids`, in store order; unknown ids are skipped
    async fn get_many(&self, ids: &[String]) -> bookclub_common::Result<Vec<BookRecord>>;

    /// First match in insertion order
    async fn find_first(&self, query: &BookQuery) -> bookclub_common::Result<Option<BookRecord>>;

    async fn find_many(
        &self,
        query: &BookQuery,
        limit: usize,
        order: BookOrder,
    ) -> bookclub_common::Result<Vec<BookRecord>>;

    async fn create(&self, book: NewBook) -> bookclub_common::Result<BookRecord>;

    /// Apply `changes`; `NotFound` if `id` does not exist
    async fn update(&self, id: &str, changes: BookUpdate) -> bookclub_common::Result<BookRecord>;
}

/// Rewrite the upstream `^` multi-author separator to `, `
pub fn normalize_author(author: &str) -> String {
    author.replace('^', ", ")
}
