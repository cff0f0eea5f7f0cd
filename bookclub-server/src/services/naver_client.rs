//! Naver book search client
//!
//! Implements `BookSearch` over the Naver Open API:
//! - `search`: detailed search by title (`book_adv.json?d_titl=`), ranked locally
//! - `search_paginated`: free-text search (`book.json?query=`)
//!
//! Requests are throttled client-side with a token bucket.

use crate::config::NaverCredentials;
use crate::types::{normalize_author, BibliographicRecord, BookSearch, SearchError, SearchPage};
use async_trait::async_trait;
use bookclub_common::config::NaverConfig;
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;

const USER_AGENT: &str = concat!("bookclub-server/", env!("CARGO_PKG_VERSION"));

/// Items requested for a single-title lookup
const LOOKUP_DISPLAY: u32 = 10;

/// Requests per second allowed by the client-side limiter
const REQUESTS_PER_SECOND: u32 = 10;

#[derive(Debug, Deserialize)]
struct NaverSearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    items: Vec<NaverBookItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NaverBookItem {
    title: String,
    link: String,
    image: String,
    author: String,
    price: String,
    discount: String,
    publisher: String,
    pubdate: String,
    isbn: String,
    description: String,
}

/// Remove `<b>`-style markup the API wraps around matched terms
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    out
}

fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// `YYYYMMDD` → `YYYY-MM-DD`
fn format_pub_date(raw: &str) -> Option<String> {
    chrono::NaiveDate::parse_from_str(raw.trim(), "%Y%m%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_price(item: &NaverBookItem) -> i64 {
    let raw = if item.price.trim().is_empty() {
        &item.discount
    } else {
        &item.price
    };
    digits_only(raw).parse().unwrap_or(0)
}

impl From<NaverBookItem> for BibliographicRecord {
    fn from(item: NaverBookItem) -> Self {
        let price = parse_price(&item);

        Self {
            title: strip_tags(&item.title).trim().to_string(),
            author: normalize_author(strip_tags(&item.author).trim()),
            description: strip_tags(&item.description).trim().to_string(),
            isbn: digits_only(&item.isbn),
            link: item.link,
            image_url: item.image,
            publisher: item.publisher,
            price,
            pub_date: format_pub_date(&item.pubdate),
        }
    }
}

/// Choose the best item for a title/author lookup
///
/// Title containment (case-insensitive, tags stripped) with an overlapping
/// author wins, then title containment alone, then the first item.
fn pick_best(items: Vec<NaverBookItem>, title: &str, author: &str) -> Option<NaverBookItem> {
    let wanted_title = title.trim().to_lowercase();
    let wanted_authors: Vec<String> = author
        .split(',')
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect();

    let title_matches = |item: &NaverBookItem| {
        strip_tags(&item.title)
            .to_lowercase()
            .contains(&wanted_title)
    };
    let author_overlaps = |item: &NaverBookItem| {
        let item_author = strip_tags(&item.author).to_lowercase();
        wanted_authors.iter().any(|a| item_author.contains(a.as_str()))
    };

    let best = items
        .iter()
        .position(|i| title_matches(i) && author_overlaps(i))
        .or_else(|| items.iter().position(|i| title_matches(i)))
        .unwrap_or(0);

    items.into_iter().nth(best)
}

/// Naver Open API book search client
pub struct NaverBookClient {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Option<NaverCredentials>,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl NaverBookClient {
    pub fn new(
        config: &NaverConfig,
        credentials: Option<NaverCredentials>,
    ) -> Result<Self, SearchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let per_second = NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<NaverSearchResponse, SearchError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            SearchError::NotConfigured("Naver client id/secret missing".to_string())
        })?;

        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Querying Naver book search");

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .header("X-Naver-Client-Id", &credentials.client_id)
            .header("X-Naver-Client-Secret", &credentials.client_secret)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl BookSearch for NaverBookClient {
    async fn search(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Option<BibliographicRecord>, SearchError> {
        let response = self
            .get(
                "/v1/search/book_adv.json",
                &[
                    ("d_titl", title.to_string()),
                    ("display", LOOKUP_DISPLAY.to_string()),
                ],
            )
            .await?;

        Ok(pick_best(response.items, title, author).map(BibliographicRecord::from))
    }

    async fn search_paginated(
        &self,
        query: &str,
        start: u32,
        display: u32,
    ) -> Result<SearchPage, SearchError> {
        let response = self
            .get(
                "/v1/search/book.json",
                &[
                    ("query", query.to_string()),
                    ("start", start.to_string()),
                    ("display", display.to_string()),
                ],
            )
            .await?;

        if response.items.is_empty() {
            return Ok(SearchPage::default());
        }

        let total = response.total;
        Ok(SearchPage {
            books: response
                .items
                .into_iter()
                .map(BibliographicRecord::from)
                .collect(),
            total,
            has_more: u64::from(start) + u64::from(display) <= total,
        })
    }
}
