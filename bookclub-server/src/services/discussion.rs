//! Discussion question generation

use crate::types::{Generator, GeneratorError};
use bookclub_common::db::BookRecord;

/// Questions requested when the caller gives no count
pub const DEFAULT_QUESTION_COUNT: usize = 5;

/// Strip a `N.` or `N)` prefix followed by whitespace
fn strip_numbering(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let rest = &line[digits..];
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;

    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let question = rest.trim();
    (!question.is_empty()).then_some(question)
}

/// Numbered lines of generator output, numbering removed
pub fn parse_questions(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| strip_numbering(line.trim()))
        .map(str::to_string)
        .collect()
}

/// Ask the generator for questions about `book`
pub async fn generate_questions(
    generator: &dyn Generator,
    book: &BookRecord,
    count: usize,
) -> Result<Vec<String>, GeneratorError> {
    let description = book.description.as_deref().unwrap_or_default();
    let text = generator
        .generate_discussion_questions(&book.title, description, count)
        .await?;

    let questions = parse_questions(&text);
    if questions.is_empty() {
        tracing::warn!(book_id = %book.id, "Generator output contained no numbered questions");
        return Err(GeneratorError::Parse(
            "no numbered questions in generator output".to_string(),
        ));
    }

    Ok(questions)
}
