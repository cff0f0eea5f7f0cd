//! Service modules: external clients and the recommendation pipeline

pub mod discussion;
pub mod naver_client;
pub mod openai_client;
pub mod recommendation;

pub use naver_client::NaverBookClient;
pub use openai_client::OpenAiClient;
pub use recommendation::{RecommendError, RecommendedBook, Recommender};
