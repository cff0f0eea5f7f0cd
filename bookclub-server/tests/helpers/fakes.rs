//! Fake collaborators for the recommendation pipeline
//!
//! - `ScriptedGenerator`: replays canned responses, counts calls
//! - `CatalogSearch`: in-memory bibliographic catalog
//! - `FailingCreateStore`: delegates to SQLite but refuses to create books

use async_trait::async_trait;
use bookclub_common::db::BookRecord;
use bookclub_server::db::SqliteBookStore;
use bookclub_server::types::{
    BibliographicRecord, BookOrder, BookQuery, BookSearch, BookStore, BookUpdate, Generator,
    GeneratorError, NewBook, SearchError, SearchPage,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted generator reply
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
}

/// Generator that replays a script, then repeats `fallback`
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    requested_counts: Mutex<Vec<usize>>,
    questions: String,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            requested_counts: Mutex::new(Vec::new()),
            questions: "1. 첫 번째 질문\n2. 두 번째 질문".to_string(),
        }
    }

    /// Always answers with `text`
    pub fn always(text: &str) -> Self {
        Self::new(Vec::new(), Reply::Text(text.to_string()))
    }

    /// Always fails
    pub fn unavailable() -> Self {
        Self::new(Vec::new(), Reply::Fail)
    }

    pub fn with_questions(mut self, questions: &str) -> Self {
        self.questions = questions.to_string();
        self
    }

    /// Number of recommendation calls so far
    pub fn calls(&self) -> usize {
        self.requested_counts.lock().unwrap().len()
    }

    /// `count` argument of every recommendation call
    pub fn requested_counts(&self) -> Vec<usize> {
        self.requested_counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate_recommendations(
        &self,
        _category: &str,
        count: usize,
    ) -> Result<String, GeneratorError> {
        self.requested_counts.lock().unwrap().push(count);

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail => Err(GeneratorError::Network("connection refused".to_string())),
        }
    }

    async fn generate_discussion_questions(
        &self,
        _title: &str,
        _description: &str,
        _count: usize,
    ) -> Result<String, GeneratorError> {
        if self.questions.is_empty() {
            return Err(GeneratorError::EmptyResponse);
        }
        Ok(self.questions.clone())
    }
}

/// Format candidates the way the generator is asked to
pub fn candidate_text(entries: &[(&str, &str, &str)]) -> String {
    entries
        .iter()
        .map(|(title, author, reason)| {
            format!("제목: {}\n저자: {}\n추천 이유: {}\n", title, author, reason)
        })
        .collect::<Vec<_>>()
        .join("---\n")
}

pub fn bibliographic(title: &str, author: &str, isbn: &str) -> BibliographicRecord {
    BibliographicRecord {
        title: title.to_string(),
        author: author.to_string(),
        description: format!("{} 소개", title),
        isbn: isbn.to_string(),
        link: format!("https://book.example/{}", isbn),
        image_url: format!("https://img.example/{}.jpg", isbn),
        publisher: "출판사".to_string(),
        price: 15000,
        pub_date: Some("2020-01-01".to_string()),
    }
}

/// Search over a fixed catalog; title containment decides a hit
pub struct CatalogSearch {
    catalog: Vec<BibliographicRecord>,
    fail: bool,
    fold_case: bool,
    queries: Mutex<Vec<(String, String)>>,
}

impl CatalogSearch {
    pub fn new(catalog: Vec<BibliographicRecord>) -> Self {
        Self {
            catalog,
            fail: false,
            fold_case: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Every request fails with an upstream error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::empty()
        }
    }

    /// Match titles ignoring case, returning the catalog's own spelling
    pub fn folding_case(mut self) -> Self {
        self.fold_case = true;
        self
    }

    /// `(title, author)` of every single-book lookup
    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookSearch for CatalogSearch {
    async fn search(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Option<BibliographicRecord>, SearchError> {
        self.queries
            .lock()
            .unwrap()
            .push((title.to_string(), author.to_string()));

        if self.fail {
            return Err(SearchError::Api(500, "upstream down".to_string()));
        }

        let wanted = title.to_lowercase();
        Ok(self
            .catalog
            .iter()
            .find(|r| {
                if self.fold_case {
                    r.title.to_lowercase().contains(&wanted)
                } else {
                    r.title.contains(title)
                }
            })
            .cloned())
    }

    async fn search_paginated(
        &self,
        query: &str,
        start: u32,
        display: u32,
    ) -> Result<SearchPage, SearchError> {
        if self.fail {
            return Err(SearchError::Api(500, "upstream down".to_string()));
        }

        let hits: Vec<_> = self
            .catalog
            .iter()
            .filter(|r| r.title.contains(query) || r.author.contains(query))
            .cloned()
            .collect();
        let total = hits.len() as u64;
        let books = hits
            .into_iter()
            .skip(start.saturating_sub(1) as usize)
            .take(display as usize)
            .collect();

        Ok(SearchPage {
            books,
            total,
            has_more: u64::from(start) + u64::from(display) <= total,
        })
    }
}

/// SQLite store whose `create` always fails
pub struct FailingCreateStore {
    pub inner: SqliteBookStore,
}

#[async_trait]
impl BookStore for FailingCreateStore {
    async fn get(&self, id: &str) -> bookclub_common::Result<Option<BookRecord>> {
        self.inner.get(id).await
    }

    async fn get_many(&self, ids: &[String]) -> bookclub_common::Result<Vec<BookRecord>> {
        self.inner.get_many(ids).await
    }

    async fn find_first(&self, query: &BookQuery) -> bookclub_common::Result<Option<BookRecord>> {
        self.inner.find_first(query).await
    }

    async fn find_many(
        &self,
        query: &BookQuery,
        limit: usize,
        order: BookOrder,
    ) -> bookclub_common::Result<Vec<BookRecord>> {
        self.inner.find_many(query, limit, order).await
    }

    async fn create(&self, _book: NewBook) -> bookclub_common::Result<BookRecord> {
        Err(bookclub_common::Error::Internal("disk full".to_string()))
    }

    async fn update(&self, id: &str, changes: BookUpdate) -> bookclub_common::Result<BookRecord> {
        self.inner.update(id, changes).await
    }
}
