use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::provider::{
    check_status, CompletionRequest, LlmProvider, ProviderError, ProviderInfo, ResponseFormat,
};

/// `generateContent` client. Has no strict schema mode, so schema requests
/// are sent as plain JSON mode and repaired by the caller.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }
}

fn generate_body(req: &CompletionRequest) -> Value {
    let mut generation = json!({ "temperature": req.temperature });
    if req.response_format != ResponseFormat::Text {
        generation["responseMimeType"] = json!("application/json");
    }
    json!({
        "systemInstruction": {"parts": [{"text": req.system}]},
        "contents": [{"role": "user", "parts": [{"text": req.user}]}],
        "generationConfig": generation
    })
}

fn extract_text(resp: &Value) -> Result<String, ProviderError> {
    if let Some(reason) = resp.pointer("/promptFeedback/blockReason").and_then(Value::as_str) {
        return Err(ProviderError::Refusal(reason.to_string()));
    }
    let parts = resp
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Parse("no candidates in response".into()))?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        return Err(ProviderError::Parse("empty completion".into()));
    }
    Ok(text)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, req: CompletionRequest) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, req.model);
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&generate_body(&req))
            .send()
            .await?;
        let json: Value = check_status(resp).await?.json().await?;
        extract_text(&json)
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        let resp = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "gemini".to_string(),
            base_url: self.base_url.clone(),
        }
    }
}
