//! OpenAI chat completions client
//!
//! Implements `Generator` for book recommendations and discussion questions.
//! Without an API key the client still constructs; every call then returns
//! `GeneratorError::NotConfigured` and the pipeline falls back to backfill.

use crate::types::{Generator, GeneratorError};
use async_trait::async_trait;
use bookclub_common::config::OpenAiConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const USER_AGENT: &str = concat!("bookclub-server/", env!("CARGO_PKG_VERSION"));

const RECOMMENDATION_TEMPERATURE: f32 = 0.5;
const DISCUSSION_TEMPERATURE: f32 = 0.7;

const CURATOR_SYSTEM_PROMPT: &str = "당신은 한국의 전문 독서 모임 큐레이터입니다. \
     한국에서 실제로 출간된 책들 중에서 독서 모임에 적합한 책을 추천해주세요. \
     가상의 책이나 존재하지 않는 책을 추천하지 마세요. \
     제목과 저자명을 정확하게 제공하는 것이 매우 중요합니다.";

const DISCUSSION_SYSTEM_PROMPT: &str = "당신은 전문 독서 토론 진행자입니다. \
     책의 핵심 주제와 의미를 깊이 있게 탐구할 수 있는 질문들을 제시해주세요.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Build the user prompt for `count` books in `category`
pub fn recommendation_prompt(category: &str, count: usize) -> String {
    format!(
        "한국에서 실제로 출간된 {category} 분야의 책을 {count}권 추천해주세요.\n\
         반드시 실제로 존재하는 책만 추천해주세요.\n\
         각 책의 제목과 저자명을 정확하게 알려주세요.\n\
         \n\
         응답 형식:\n\
         제목: [정확한 책 제목]\n\
         저자: [정확한 저자 이름]\n\
         추천 이유: [독서 모임에 추천하는 이유 한두 문장]\n\
         ---"
    )
}

/// Build the user prompt for discussion questions
pub fn discussion_prompt(title: &str, description: &str, count: usize) -> String {
    format!(
        "\"{title}\"에 대한 독서 모임 발제 질문 {count}개를 번호를 붙여 생성해주세요. 책 설명: {description}"
    )
}

/// OpenAI-compatible chat completions client
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, api_key: Option<String>) -> Result<Self, GeneratorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| GeneratorError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, GeneratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GeneratorError::NotConfigured("OpenAI API key missing".to_string()))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, url = %url, "Requesting chat completion");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeneratorError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api(status.as_u16(), error_text));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))?;

        extract_content(body)
    }
}

/// First choice's text, rejecting blank output
fn extract_content(body: ChatResponse) -> Result<String, GeneratorError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(GeneratorError::EmptyResponse)
}

#[async_trait]
impl Generator for OpenAiClient {
    async fn generate_recommendations(
        &self,
        category: &str,
        count: usize,
    ) -> Result<String, GeneratorError> {
        self.complete(
            CURATOR_SYSTEM_PROMPT,
            &recommendation_prompt(category, count),
            RECOMMENDATION_TEMPERATURE,
        )
        .await
    }

    async fn generate_discussion_questions(
        &self,
        title: &str,
        description: &str,
        count: usize,
    ) -> Result<String, GeneratorError> {
        self.complete(
            DISCUSSION_SYSTEM_PROMPT,
            &discussion_prompt(title, description, count),
            DISCUSSION_TEMPERATURE,
        )
        .await
    }
}
