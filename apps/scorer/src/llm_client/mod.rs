//! LLM Client: the single point of entry for all Gemini calls in the scorer.
//!
//! Talks to the Vertex AI `generateContent` endpoint for one configured
//! project, region and model. The pipeline only sees the `TextModel` trait.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

mod model;

pub use model::GeminiModel;

const BACKOFF_BASE_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Gave up after {retries} retries: {last}")]
    RetriesExhausted { retries: u32, last: Box<LlmError> },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Quota exhaustion (429), server errors and transport failures may go away
    /// on their own; everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::RetriesExhausted { .. } | LlmError::EmptyContent => false,
        }
    }
}

/// Anything that turns a prompt into reply text.
#[async_trait]
pub trait TextModel: Send + Sync {
    fn model_id(&self) -> &str;

    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn user_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate's parts.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct VertexError {
    error: VertexErrorBody,
}

#[derive(Debug, Deserialize)]
struct VertexErrorBody {
    message: String,
}

/// Everything the client needs to address one Vertex AI model.
#[derive(Debug, Clone)]
pub struct VertexSettings {
    pub project_id: String,
    pub location: String,
    pub access_token: String,
    pub model: GeminiModel,
    /// Base URL; `None` means the regional `aiplatform.googleapis.com` host.
    pub endpoint: Option<String>,
    pub max_retries: u32,
}

impl VertexSettings {
    pub fn generate_url(&self) -> String {
        let base = self
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", self.location));
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            base.trim_end_matches('/'),
            self.project_id,
            self.location,
            self.model.id()
        )
    }
}

/// Gemini client on Vertex AI. Built once at startup and handed to the pipeline.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    settings: VertexSettings,
    url: String,
}

impl LlmClient {
    pub fn new(settings: VertexSettings) -> Result<Self, LlmError> {
        let url = settings.generate_url();
        Ok(Self {
            client: Client::builder().build()?,
            settings,
            url,
        })
    }

    /// Makes a `generateContent` call, returning the full response object.
    /// Transient failures are retried with exponential backoff, up to
    /// `max_retries` times.
    pub async fn call(&self, prompt: &str) -> Result<GenerateResponse, LlmError> {
        let request_body = GenerateRequest::user_prompt(prompt);
        let max_retries = self.settings.max_retries;
        let mut attempt = 0;

        loop {
            let error = match self.send_once(&request_body).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if !error.is_transient() || max_retries == 0 {
                return Err(error);
            }
            if attempt >= max_retries {
                return Err(LlmError::RetriesExhausted {
                    retries: max_retries,
                    last: Box::new(error),
                });
            }

            let delay = backoff_delay(attempt);
            attempt += 1;
            warn!(
                "LLM call failed ({}), retry {}/{} after {}ms",
                error,
                attempt,
                max_retries,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn send_once(
        &self,
        request_body: &GenerateRequest<'_>,
    ) -> Result<GenerateResponse, LlmError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.settings.access_token)
            .json(request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<VertexError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let generated: GenerateResponse = response.json().await?;

        if let Some(usage) = &generated.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(generated)
    }
}

#[async_trait]
impl TextModel for LlmClient {
    fn model_id(&self) -> &str {
        self.settings.model.id()
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;
        match response.text() {
            Some(text) => Ok(text),
            None => {
                let reason = response
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.as_deref())
                    .unwrap_or("no candidates");
                warn!("LLM reply carried no text (finish reason: {reason})");
                Err(LlmError::EmptyContent)
            }
        }
    }
}

/// 1s, 2s, 4s, ... for attempt 0, 1, 2, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS << attempt.min(16))
}

/// Strips a ```` ```json ```` / ```` ``` ```` fence from LLM output. The leading
/// and trailing markers are removed independently.
pub fn strip_json_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}
