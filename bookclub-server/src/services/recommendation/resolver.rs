//! Candidate resolution
//!
//! Maps a parsed candidate to a persisted book: store first, external search
//! second. A search hit whose ISBN is already stored reuses that record, so a
//! search service that rewrites titles cannot produce a second record for the
//! same book. Every failure (store error, search error, search miss) becomes
//! `Resolution::Unresolved`; one bad candidate never aborts the batch.

use super::matcher::MatchStrategy;
use super::parser::Candidate;
use crate::types::{
    normalize_author, BibliographicRecord, BookOrder, BookQuery, BookSearch, BookStore,
    BookUpdate, NewBook,
};
use bookclub_common::db::BookRecord;
use tracing::{debug, warn};

/// Why a candidate could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// Search answered with no result
    NotFound,
    /// Search service failed
    SearchFailed,
    /// Store read or write failed
    StoreFailed,
}

/// Outcome of resolving one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(BookRecord),
    Unresolved(UnresolvedReason),
}

/// Finds or creates the book record for a candidate
pub struct CandidateResolver<'a> {
    store: &'a dyn BookStore,
    search: &'a dyn BookSearch,
    matcher: &'a dyn MatchStrategy,
}

impl<'a> CandidateResolver<'a> {
    pub fn new(
        store: &'a dyn BookStore,
        search: &'a dyn BookSearch,
        matcher: &'a dyn MatchStrategy,
    ) -> Self {
        Self {
            store,
            search,
            matcher,
        }
    }

    /// Resolve `candidate`, tagging new or matched records with `category`
    pub async fn resolve(&self, candidate: &Candidate, category: Option<&str>) -> Resolution {
        let author = normalize_author(&candidate.author);
        let title = candidate.title.as_str();
        let reason = candidate.reason.as_deref().filter(|r| !r.trim().is_empty());
        let category = category.filter(|c| !c.is_empty());

        let existing = match self.lookup(title, &author).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!(title = %title, author = %author, error = %e, "Book lookup failed");
                return Resolution::Unresolved(UnresolvedReason::StoreFailed);
            }
        };

        if let Some(book) = existing {
            return self.refresh(book, category, reason).await;
        }

        let record = match self.search.search(title, &author).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(title = %title, author = %author, "No search result for candidate");
                return Resolution::Unresolved(UnresolvedReason::NotFound);
            }
            Err(e) => {
                warn!(title = %title, author = %author, error = %e, "Book search failed");
                return Resolution::Unresolved(UnresolvedReason::SearchFailed);
            }
        };

        match self.find_searched(&record).await {
            Ok(Some(book)) => {
                debug!(book_id = %book.id, isbn = %record.isbn, "Search hit already stored");
                return self.refresh(book, category, reason).await;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(title = %title, error = %e, "Stored search hit lookup failed");
                return Resolution::Unresolved(UnresolvedReason::StoreFailed);
            }
        }

        match self
            .store
            .create(NewBook::from_bibliographic(record, category, reason))
            .await
        {
            Ok(book) => {
                debug!(book_id = %book.id, title = %book.title, "Persisted book from search");
                Resolution::Resolved(book)
            }
            Err(e) => {
                warn!(title = %title, error = %e, "Failed to persist searched book");
                Resolution::Unresolved(UnresolvedReason::StoreFailed)
            }
        }
    }

    async fn lookup(&self, title: &str, author: &str) -> bookclub_common::Result<Option<BookRecord>> {
        let query = self.matcher.query(title, author);
        let limit = self.matcher.scan_limit();

        if limit <= 1 {
            let found = self.store.find_first(&query).await?;
            return Ok(found.filter(|b| self.matcher.accepts(b, title, author)));
        }

        let rows = self
            .store
            .find_many(&query, limit, BookOrder::OldestFirst)
            .await?;
        let mut best: Option<(f64, BookRecord)> = None;
        for book in rows {
            if !self.matcher.accepts(&book, title, author) {
                continue;
            }
            let score = self.matcher.score(&book, title, author);
            if best.as_ref().map_or(true, |(top, _)| score > *top) {
                best = Some((score, book));
            }
        }
        Ok(best.map(|(_, book)| book))
    }

    /// Existing record for a search hit: same ISBN, or same title and author
    /// when the hit carries no ISBN
    async fn find_searched(
        &self,
        record: &BibliographicRecord,
    ) -> bookclub_common::Result<Option<BookRecord>> {
        let query = if record.isbn.is_empty() {
            BookQuery::new()
                .title_contains(record.title.as_str())
                .author_contains(normalize_author(&record.author))
        } else {
            BookQuery::new().isbn(record.isbn.as_str())
        };
        self.store.find_first(&query).await
    }

    /// Apply a changed reason or category to a matched record
    async fn refresh(
        &self,
        book: BookRecord,
        category: Option<&str>,
        reason: Option<&str>,
    ) -> Resolution {
        let changes = BookUpdate {
            category: category
                .filter(|c| *c != book.category)
                .map(str::to_string),
            recommendation_reason: reason
                .filter(|r| book.recommendation_reason.as_deref() != Some(*r))
                .map(str::to_string),
        };

        if changes.is_empty() {
            return Resolution::Resolved(book);
        }

        match self.store.update(&book.id, changes).await {
            Ok(updated) => Resolution::Resolved(updated),
            Err(e) => {
                warn!(book_id = %book.id, error = %e, "Failed to update matched book");
                Resolution::Unresolved(UnresolvedReason::StoreFailed)
            }
        }
    }
}
