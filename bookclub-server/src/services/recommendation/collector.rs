//! Deduplicating collection loop
//!
//! Repeats generate → parse → resolve rounds until the requested number of
//! distinct books is reached or `MAX_ROUNDS` generation calls have been made.
//! Every resolved book, whether it came from a round or from backfill, goes
//! through `ResultSet::offer`, the single place that tracks seen ids.

use super::parser::parse;
use super::resolver::{CandidateResolver, Resolution};
use crate::types::Generator;
use bookclub_common::db::BookRecord;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Generation calls per collection, regardless of outcome
pub const MAX_ROUNDS: usize = 3;

/// Extra candidates requested per round to absorb parse and resolve losses
pub const OVER_ASK: usize = 2;

/// Where a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSource {
    /// Resolved from generator output
    Generated,
    /// Existing record in the same category
    Backfill,
}

/// What `ResultSet::offer` did with a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    Duplicate,
    Unresolved,
    /// Set already holds `capacity` books
    Full,
}

/// Ordered, capacity-bounded set of distinct books
#[derive(Debug, Clone)]
pub struct ResultSet {
    books: Vec<(BookRecord, BookSource)>,
    seen_ids: HashSet<String>,
    capacity: usize,
    duplicates: usize,
    unresolved: usize,
}

impl ResultSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            books: Vec::with_capacity(capacity),
            seen_ids: HashSet::with_capacity(capacity),
            capacity,
            duplicates: 0,
            unresolved: 0,
        }
    }

    /// Reduce one resolution into the set
    pub fn offer(&mut self, resolution: Resolution, source: BookSource) -> Offer {
        if self.is_full() {
            return Offer::Full;
        }

        match resolution {
            Resolution::Resolved(book) => {
                if self.seen_ids.insert(book.id.clone()) {
                    self.books.push((book, source));
                    Offer::Accepted
                } else {
                    self.duplicates += 1;
                    Offer::Duplicate
                }
            }
            Resolution::Unresolved(_) => {
                self.unresolved += 1;
                Offer::Unresolved
            }
        }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.books.len() >= self.capacity
    }

    /// Books still needed to reach capacity
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.books.len())
    }

    /// Accepted ids in insertion order
    pub fn ids(&self) -> Vec<String> {
        self.books.iter().map(|(b, _)| b.id.clone()).collect()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn unresolved(&self) -> usize {
        self.unresolved
    }

    pub fn into_entries(self) -> Vec<(BookRecord, BookSource)> {
        self.books
    }
}

/// Result of one collection run
#[derive(Debug, Clone)]
pub struct Collection {
    pub results: ResultSet,
    /// Rounds that completed (a failed generation call does not count)
    pub rounds_attempted: usize,
    /// Collection stopped because the generator produced nothing
    pub generator_failed: bool,
}

/// Drives generation rounds through the resolver
pub struct Collector<'a> {
    generator: &'a dyn Generator,
    resolver: CandidateResolver<'a>,
}

impl<'a> Collector<'a> {
    pub fn new(generator: &'a dyn Generator, resolver: CandidateResolver<'a>) -> Self {
        Self {
            generator,
            resolver,
        }
    }

    /// Collect up to `count` distinct books for `category`
    pub async fn collect(&self, category: &str, count: usize) -> Collection {
        let mut results = ResultSet::with_capacity(count);
        let mut rounds_attempted = 0;
        let mut generator_failed = false;

        while !results.is_full() && rounds_attempted < MAX_ROUNDS {
            let ask = results.remaining() + OVER_ASK;

            let text = match self.generator.generate_recommendations(category, ask).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    warn!(category = %category, round = rounds_attempted + 1, "Generator returned empty text");
                    generator_failed = true;
                    break;
                }
                Err(e) => {
                    warn!(category = %category, round = rounds_attempted + 1, error = %e, "Generator unavailable");
                    generator_failed = true;
                    break;
                }
            };

            let candidates = parse(&text);
            debug!(
                category = %category,
                round = rounds_attempted + 1,
                requested = ask,
                parsed = candidates.len(),
                "Parsed generator output"
            );

            for candidate in &candidates {
                if results.is_full() {
                    break;
                }

                let resolution = self.resolver.resolve(candidate, Some(category)).await;
                if results.offer(resolution, BookSource::Generated) == Offer::Duplicate {
                    debug!(title = %candidate.title, "Skipping duplicate book");
                }
            }

            rounds_attempted += 1;
        }

        info!(
            category = %category,
            requested = count,
            collected = results.len(),
            rounds = rounds_attempted,
            duplicates = results.duplicates(),
            unresolved = results.unresolved(),
            "Collection finished"
        );

        Collection {
            results,
            rounds_attempted,
            generator_failed,
        }
    }
}
