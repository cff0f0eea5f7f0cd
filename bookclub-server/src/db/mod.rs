//! Database access for bookclub-server
//!
//! Shared SQLite database; the schema itself lives in `bookclub_common::db`.

pub mod books;
pub mod discussions;
pub mod meetings;

pub use books::SqliteBookStore;
