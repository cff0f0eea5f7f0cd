//! HTTP API handlers for bookclub-server
//!
//! JSON over HTTP; request and response bodies use camelCase keys.

pub mod books;
pub mod discussions;
pub mod health;
pub mod meetings;

pub use books::book_routes;
pub use discussions::discussion_routes;
pub use health::health_routes;
pub use meetings::meeting_routes;
