//! # Book Club Common Library
//!
//! Shared code for the book club services including:
//! - Database initialization and row models
//! - Bootstrap configuration loading and root folder resolution
//! - Common error type
//! - Identifier utilities

pub mod config;
pub mod db;
pub mod error;
pub mod uuid_utils;

pub use error::{Error, Result};
