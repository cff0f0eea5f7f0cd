//! Category backfill from existing records

use crate::types::{BookOrder, BookQuery, BookStore};
use bookclub_common::db::BookRecord;
use tracing::{debug, warn};

/// Up to `shortfall` stored books in `category`, newest first, skipping `exclude_ids`
///
/// Store errors are logged and yield an empty list; the caller keeps whatever
/// the generation rounds produced.
pub async fn backfill(
    store: &dyn BookStore,
    category: &str,
    shortfall: usize,
    exclude_ids: &[String],
) -> Vec<BookRecord> {
    if shortfall == 0 {
        return Vec::new();
    }

    let query = BookQuery::new()
        .category(category)
        .excluding(exclude_ids.to_vec());

    match store
        .find_many(&query, shortfall, BookOrder::NewestFirst)
        .await
    {
        Ok(books) => {
            debug!(category = %category, shortfall, found = books.len(), "Backfill query complete");
            books
        }
        Err(e) => {
            warn!(category = %category, error = %e, "Backfill query failed");
            Vec::new()
        }
    }
}
