//! Candidate-to-record matching strategies
//!
//! A strategy narrows the store lookup with a `BookQuery` and then confirms
//! each returned record in memory. The resolver only ever sees the trait, so a
//! stricter strategy can replace the default without touching the collector.

use crate::types::BookQuery;
use bookclub_common::db::BookRecord;

/// How a (title, author) candidate is matched against persisted books
///
/// `author` is already normalized (`^` rewritten to `, `).
pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Store-side predicate; every accepted record must satisfy it
    fn query(&self, title: &str, author: &str) -> BookQuery;

    /// In-memory confirmation of a record returned by `query`
    fn accepts(&self, record: &BookRecord, title: &str, author: &str) -> bool;

    /// Rank of an accepted record; the resolver keeps the highest, earliest
    /// stored record on ties
    fn score(&self, _record: &BookRecord, _title: &str, _author: &str) -> f64 {
        1.0
    }

    /// Number of store rows to examine
    fn scan_limit(&self) -> usize {
        1
    }
}

/// Loose containment: stored title contains the candidate title and stored
/// author contains the candidate author (case-sensitive)
///
/// Can produce false positives ("War and Peace" matches "The War and Peace
/// Museum Guide"); see `SimilarityMatch` for a stricter alternative.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatch;

impl MatchStrategy for SubstringMatch {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn query(&self, title: &str, author: &str) -> BookQuery {
        BookQuery::new().title_contains(title).author_contains(author)
    }

    fn accepts(&self, record: &BookRecord, title: &str, author: &str) -> bool {
        record.title.contains(title) && record.author.contains(author)
    }
}

/// Author containment plus normalized edit-distance similarity on titles
#[derive(Debug, Clone, Copy)]
pub struct SimilarityMatch {
    /// Minimum normalized Levenshtein similarity (0.0-1.0)
    pub threshold: f64,
    /// Rows sharing the author to compare, oldest first
    ///
    /// A matching record beyond this bound is not seen by the lookup; the
    /// resolver still finds it after the search step when it carries the
    /// hit's ISBN.
    pub scan_limit: usize,
}

impl Default for SimilarityMatch {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            scan_limit: 50,
        }
    }
}

impl SimilarityMatch {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            ..Default::default()
        }
    }
}

/// Lowercase and drop whitespace and punctuation
fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn title_similarity(stored: &str, wanted: &str) -> f64 {
    let stored = normalize_title(stored);
    let wanted = normalize_title(wanted);
    if stored.is_empty() || wanted.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&stored, &wanted)
}

impl MatchStrategy for SimilarityMatch {
    fn name(&self) -> &'static str {
        "similarity"
    }

    fn query(&self, _title: &str, author: &str) -> BookQuery {
        BookQuery::new().author_contains(author)
    }

    fn accepts(&self, record: &BookRecord, title: &str, author: &str) -> bool {
        if !record.author.contains(author) {
            return false;
        }

        title_similarity(&record.title, title) >= self.threshold
    }

    fn score(&self, record: &BookRecord, title: &str, _author: &str) -> f64 {
        title_similarity(&record.title, title)
    }

    fn scan_limit(&self) -> usize {
        self.scan_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, author: &str) -> BookRecord {
        BookRecord {
            id: "id".to_string(),
            title: title.to_string(),
            author: author.to_string(),
            description: None,
            isbn: None,
            category: String::new(),
            image_url: None,
            link: None,
            publisher: None,
            price: None,
            pub_date: None,
            recommendation_reason: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_substring_accepts_containment() {
        let m = SubstringMatch;
        let r = record("The War and Peace Museum Guide", "Kim, Lee");

        assert!(m.accepts(&r, "War and Peace", "Kim"));
        assert!(!m.accepts(&r, "war and peace", "Kim"));
        assert!(!m.accepts(&r, "War and Peace", "Park"));
    }

    #[test]
    fn test_substring_query_is_consistent_with_accepts() {
        let m = SubstringMatch;
        let r = record("채식주의자", "한강");
        let query = m.query("채식주의자", "한강");

        assert!(query.matches(&r));
        assert!(m.accepts(&r, "채식주의자", "한강"));
    }

    #[test]
    fn test_similarity_rejects_loose_containment() {
        let m = SimilarityMatch::default();
        let r = record("The War and Peace Museum Guide", "Tolstoy");
        assert!(!m.accepts(&r, "War and Peace", "Tolstoy"));
    }

    #[test]
    fn test_similarity_absorbs_spacing_and_punctuation() {
        let m = SimilarityMatch::default();
        let r = record("정의란 무엇인가?", "마이클 샌델");

        assert!(m.accepts(&r, "정의란무엇인가", "마이클 샌델"));
        assert!(!m.accepts(&r, "정의란무엇인가", "다른 저자"));
    }

    #[test]
    fn test_similarity_scores_exact_title_highest() {
        let m = SimilarityMatch::new(0.5);
        let exact = record("이방인", "알베르 카뮈");
        let near = record("이방인들", "알베르 카뮈");

        assert!(m.score(&exact, "이방인", "알베르 카뮈") > m.score(&near, "이방인", "알베르 카뮈"));
        assert_eq!(SubstringMatch.score(&exact, "이방인", "알베르 카뮈"), 1.0);
    }

    #[test]
    fn test_similarity_threshold_is_clamped() {
        assert_eq!(SimilarityMatch::new(1.5).threshold, 1.0);
        assert_eq!(SimilarityMatch::new(-1.0).threshold, 0.0);
    }
}
