//! Recommendation pipeline
//!
//! `Recommender::recommend` turns a category and a count into a list of
//! distinct, persisted books:
//!
//! 1. **Collect** (`collector`): generate → parse → resolve, up to
//!    `MAX_ROUNDS` generation calls, deduplicated by book id
//! 2. **Backfill** (`backfill`): top up any shortfall with stored books in the
//!    same category, newest first, excluding ids already selected
//! 3. Fail with `NoBooksAvailable` only when both paths produced nothing
//!
//! Generator output is a hint, not ground truth: every candidate must resolve
//! to a stored record or an external search hit before it is returned.

pub mod backfill;
pub mod collector;
pub mod matcher;
pub mod parser;
pub mod resolver;

pub use collector::{BookSource, Collection, Collector, ResultSet, MAX_ROUNDS, OVER_ASK};
pub use matcher::{MatchStrategy, SimilarityMatch, SubstringMatch};
pub use parser::{parse, Candidate};
pub use resolver::{CandidateResolver, Resolution, UnresolvedReason};

use crate::types::{BookSearch, BookStore, Generator};
use bookclub_common::db::BookRecord;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Books returned when no count is given
pub const DEFAULT_COUNT: usize = 5;

/// Largest count a single request may ask for
pub const MAX_COUNT: usize = 20;

/// Summary for books that carry no recommendation reason
pub const DEFAULT_SUMMARY: &str = "이 분야의 인기 도서로, 많은 독자들에게 좋은 평가를 받았습니다.";

/// Caller-facing pipeline errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecommendError {
    #[error("Count must be between 1 and {max}, got {count}")]
    InvalidCount { count: usize, max: usize },

    #[error("No books available for category '{category}'")]
    NoBooksAvailable { category: String },
}

/// One book in a recommendation result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedBook {
    #[serde(flatten)]
    pub book: BookRecord,
    pub summary: String,
    pub source: BookSource,
}

impl RecommendedBook {
    fn new(book: BookRecord, source: BookSource) -> Self {
        let summary = book
            .recommendation_reason
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SUMMARY.to_string());

        Self {
            book,
            summary,
            source,
        }
    }
}

/// Recommendation pipeline over injected collaborators
pub struct Recommender {
    generator: Arc<dyn Generator>,
    search: Arc<dyn BookSearch>,
    store: Arc<dyn BookStore>,
    matcher: Arc<dyn MatchStrategy>,
}

impl Recommender {
    pub fn new(
        generator: Arc<dyn Generator>,
        search: Arc<dyn BookSearch>,
        store: Arc<dyn BookStore>,
    ) -> Self {
        Self {
            generator,
            search,
            store,
            matcher: Arc::new(SubstringMatch),
        }
    }

    /// Replace the default substring matcher
    pub fn with_matcher(mut self, matcher: Arc<dyn MatchStrategy>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn matcher_name(&self) -> &'static str {
        self.matcher.name()
    }

    /// Resolver bound to this recommender's collaborators
    pub fn resolver(&self) -> CandidateResolver<'_> {
        CandidateResolver::new(
            self.store.as_ref(),
            self.search.as_ref(),
            self.matcher.as_ref(),
        )
    }

    /// Run the generation rounds only
    pub async fn collect(&self, category: &str, count: usize) -> Collection {
        Collector::new(self.generator.as_ref(), self.resolver())
            .collect(category, count)
            .await
    }

    /// Up to `count` distinct books for `category`
    ///
    /// Fewer than `count` books is a normal result. Only an empty result is
    /// an error.
    pub async fn recommend(
        &self,
        category: &str,
        count: usize,
    ) -> Result<Vec<RecommendedBook>, RecommendError> {
        if count == 0 || count > MAX_COUNT {
            return Err(RecommendError::InvalidCount {
                count,
                max: MAX_COUNT,
            });
        }

        let Collection {
            mut results,
            rounds_attempted,
            generator_failed,
        } = self.collect(category, count).await;
        let generated = results.len();

        if !results.is_full() {
            let extra = backfill::backfill(
                self.store.as_ref(),
                category,
                results.remaining(),
                &results.ids(),
            )
            .await;

            for book in extra {
                results.offer(Resolution::Resolved(book), BookSource::Backfill);
            }
        }

        if results.is_empty() {
            warn!(
                category = %category,
                rounds = rounds_attempted,
                generator_failed,
                "No books available from any source"
            );
            return Err(RecommendError::NoBooksAvailable {
                category: category.to_string(),
            });
        }

        info!(
            category = %category,
            requested = count,
            returned = results.len(),
            generated,
            backfilled = results.len() - generated,
            rounds = rounds_attempted,
            "Recommendation complete"
        );

        Ok(results
            .into_entries()
            .into_iter()
            .map(|(book, source)| RecommendedBook::new(book, source))
            .collect())
    }
}
