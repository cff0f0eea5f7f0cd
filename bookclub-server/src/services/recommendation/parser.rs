//! Candidate extraction from generator text
//!
//! The generator is asked for entries of labelled lines separated by `---`:
//!
//! ```text
//! 제목: 정의란 무엇인가
//! 저자: 마이클 샌델
//! 추천 이유: 토론거리가 풍부하다
//! ---
//! 제목: ...
//! ```
//!
//! Output is free text, so every rule here is lenient: a segment without both
//! a title and an author is dropped, never reported.

use serde::{Deserialize, Serialize};

/// Literal separator between entries
pub const ROUND_SEPARATOR: &str = "\n---\n";

const TITLE_LABEL: &str = "제목:";
const AUTHOR_LABEL: &str = "저자:";
const REASON_LABEL: &str = "추천 이유:";

/// Unresolved (title, author, reason) triple from one segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub author: String,
    pub reason: Option<String>,
}

/// Extract candidates in input order; no deduplication
pub fn parse(text: &str) -> Vec<Candidate> {
    let text = text.replace("\r\n", "\n");

    text.split(ROUND_SEPARATOR)
        .filter(|segment| !segment.trim().is_empty())
        .filter_map(parse_segment)
        .collect()
}

fn parse_segment(segment: &str) -> Option<Candidate> {
    let title = labelled_value(segment, TITLE_LABEL)?;
    let author = labelled_value(segment, AUTHOR_LABEL)?;
    let reason = labelled_value(segment, REASON_LABEL);

    Some(Candidate {
        title,
        author,
        reason,
    })
}

/// Value of the first line carrying `label`
///
/// The label may be preceded by list markers (`1. 제목:`, `- 제목:`,
/// `**제목:**`) but not by a letter, so `부제목:` is not a title line.
fn labelled_value(segment: &str, label: &str) -> Option<String> {
    segment.lines().find_map(|line| {
        let start = line.find(label)?;
        let preceded_by_letter = line[..start]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric);
        if preceded_by_letter {
            return None;
        }

        let value = line[start + label.len()..]
            .trim()
            .trim_matches('*')
            .trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}
