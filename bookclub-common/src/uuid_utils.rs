//! Identifier utilities
//!
//! Records are keyed by UUIDv4 strings. The store treats them as opaque.

use uuid::Uuid;

/// Generate a new record identifier
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parse UUID from string
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}
