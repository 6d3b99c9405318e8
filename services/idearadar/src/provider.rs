use async_trait::async_trait;
use serde_json::Value;

use crate::types_jobs::{RemoteJob, RemoteJobRequest};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub base_url: String,
}

/// How the model is asked to shape its answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
    /// Strict structured output. Providers without it fall back to JSON mode.
    JsonSchema { name: String, schema: Value },
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider misconfigured: {0}")]
    Config(String),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected provider response: {0}")]
    Parse(String),
    #[error("model refused: {0}")]
    Refusal(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Parse(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Text generation used by the analysis client.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, req: CompletionRequest) -> Result<String, ProviderError>;
    async fn ping(&self) -> Result<(), ProviderError>;
    fn info(&self) -> ProviderInfo;
}

/// File upload and job control for model fine-tuning.
#[async_trait]
pub trait FineTuneProvider: Send + Sync {
    async fn upload_training_file(&self, name: &str, bytes: Vec<u8>) -> Result<String, ProviderError>;
    async fn create_job(&self, req: RemoteJobRequest) -> Result<RemoteJob, ProviderError>;
    async fn retrieve_job(&self, remote_id: &str) -> Result<RemoteJob, ProviderError>;
    async fn cancel_job(&self, remote_id: &str) -> Result<RemoteJob, ProviderError>;
}

/// Pulls a readable message out of an error body, falling back to the raw text.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}
