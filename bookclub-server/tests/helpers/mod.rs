//! Test Helper Utilities
//!
//! Shared utilities for testing bookclub-server

#![allow(dead_code)]

pub mod db_utils;
pub mod fakes;

pub use db_utils::{count_books, create_test_pool, seed_book};
pub use fakes::{
    bibliographic, candidate_text, CatalogSearch, FailingCreateStore, Reply, ScriptedGenerator,
};
