use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::llm_client::{GeminiModel, VertexSettings};

/// Runtime configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_id: String,
    pub location: String,
    pub access_token: String,
    pub model: GeminiModel,
    pub vertex_endpoint: Option<String>,
    /// Pause before every model call.
    pub request_delay: Duration,
    /// Retries for quota/server/transport failures; 0 makes the first failure fatal.
    pub max_retries: u32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let model = match optional_env("GEMINI_MODEL") {
            Some(raw) => raw.parse::<GeminiModel>().map_err(|e| anyhow!(e))?,
            None => GeminiModel::default(),
        };

        Ok(Config {
            project_id: require_env("GCP_PROJECT_ID")?,
            location: optional_env("GCP_LOCATION").unwrap_or_else(|| "us-central1".to_string()),
            access_token: require_env("GOOGLE_ACCESS_TOKEN")?,
            model,
            vertex_endpoint: optional_env("VERTEX_ENDPOINT"),
            request_delay: Duration::from_secs(parse_env("REQUEST_DELAY_SECS", 10)?),
            max_retries: parse_env("LLM_MAX_RETRIES", 0)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Command-line values win over the environment.
    pub fn apply_overrides(&mut self, model: Option<GeminiModel>, delay_secs: Option<u64>) {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(secs) = delay_secs {
            self.request_delay = Duration::from_secs(secs);
        }
    }

    pub fn vertex_settings(&self) -> VertexSettings {
        VertexSettings {
            project_id: self.project_id.clone(),
            location: self.location.clone(),
            access_token: self.access_token.clone(),
            model: self.model,
            endpoint: self.vertex_endpoint.clone(),
            max_retries: self.max_retries,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'")),
        None => Ok(default),
    }
}
