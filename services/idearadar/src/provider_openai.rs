use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::provider::{
    check_status, CompletionRequest, FineTuneProvider, LlmProvider, ProviderError, ProviderInfo,
    ResponseFormat,
};
use crate::types_jobs::{JobStatus, RemoteJob, RemoteJobRequest};

/// Chat completions plus the files / fine-tuning endpoints of an
/// OpenAI-compatible API.
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
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

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub(crate) fn chat_body(req: &CompletionRequest) -> Value {
    let mut body = json!({
        "model": req.model,
        "messages": [
            {"role": "system", "content": req.system},
            {"role": "user", "content": req.user}
        ],
        "temperature": req.temperature
    });
    match &req.response_format {
        ResponseFormat::Text => {}
        ResponseFormat::JsonObject => {
            body["response_format"] = json!({"type": "json_object"});
        }
        ResponseFormat::JsonSchema { name, schema } => {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {"name": name, "strict": true, "schema": schema}
            });
        }
    }
    body
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct FileObject {
    id: String,
}

#[derive(Deserialize)]
struct JobObject {
    id: String,
    status: String,
    fine_tuned_model: Option<String>,
    trained_tokens: Option<i64>,
    error: Option<JobErrorObject>,
}

#[derive(Deserialize)]
struct JobErrorObject {
    message: Option<String>,
}

impl From<JobObject> for RemoteJob {
    fn from(j: JobObject) -> Self {
        RemoteJob {
            status: JobStatus::from_provider(&j.status),
            id: j.id,
            fine_tuned_model: j.fine_tuned_model,
            trained_tokens: j.trained_tokens,
            // the API sends an error object with null fields on healthy jobs
            error_message: j.error.and_then(|e| e.message).filter(|m| !m.is_empty()),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, req: CompletionRequest) -> Result<String, ProviderError> {
        let resp = self
            .client
            .post(self.url("/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&chat_body(&req))
            .send()
            .await?;
        let parsed: ChatResponse = check_status(resp).await?.json().await?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ProviderError::Parse("no choices in completion".into()))?;
        if let Some(refusal) = message.refusal {
            return Err(ProviderError::Refusal(refusal));
        }
        message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::Parse("empty completion".into()))
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        let resp = self
            .client
            .get(self.url("/models"))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "openai".to_string(),
            base_url: self.base_url.clone(),
        }
    }
}

#[async_trait]
impl FineTuneProvider for OpenAiProvider {
    async fn upload_training_file(&self, name: &str, bytes: Vec<u8>) -> Result<String, ProviderError> {
        let part = Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str("application/jsonl")?;
        let form = Form::new().text("purpose", "fine-tune").part("file", part);

        let resp = self
            .client
            .post(self.url("/files"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let file: FileObject = check_status(resp).await?.json().await?;
        Ok(file.id)
    }

    async fn create_job(&self, req: RemoteJobRequest) -> Result<RemoteJob, ProviderError> {
        let resp = self
            .client
            .post(self.url("/fine_tuning/jobs"))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;
        let job: JobObject = check_status(resp).await?.json().await?;
        Ok(job.into())
    }

    async fn retrieve_job(&self, remote_id: &str) -> Result<RemoteJob, ProviderError> {
        let resp = self
            .client
            .get(self.url(&format!("/fine_tuning/jobs/{remote_id}")))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let job: JobObject = check_status(resp).await?.json().await?;
        Ok(job.into())
    }

    async fn cancel_job(&self, remote_id: &str) -> Result<RemoteJob, ProviderError> {
        let resp = self
            .client
            .post(self.url(&format!("/fine_tuning/jobs/{remote_id}/cancel")))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let job: JobObject = check_status(resp).await?.json().await?;
        Ok(job.into())
    }
}
