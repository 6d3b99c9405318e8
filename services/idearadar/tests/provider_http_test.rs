use std::time::Duration;

use idearadar::provider::{CompletionRequest, FineTuneProvider, LlmProvider, ProviderError, ResponseFormat};
use idearadar::provider_gemini::GeminiProvider;
use idearadar::provider_openai::OpenAiProvider;
use idearadar::types_jobs::{Hyperparameters, JobStatus, RemoteJobRequest};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new(server.uri(), "sk-test".into(), Duration::from_secs(5)).unwrap()
}

fn request(format: ResponseFormat) -> CompletionRequest {
    CompletionRequest {
        model: "gpt-4o-mini".into(),
        system: "rubric".into(),
        user: "Title: Dog walking app".into(),
        temperature: 0.2,
        response_format: format,
    }
}

fn chat_reply(message: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": message, "finish_reason": "stop"}]
    }))
}

#[tokio::test]
async fn completion_sends_schema_and_returns_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "response_format": {"type": "json_schema", "json_schema": {"name": "idea_analysis", "strict": true}}
        })))
        .respond_with(chat_reply(json!({"role": "assistant", "content": "{\"ok\":true}", "refusal": null})))
        .expect(1)
        .mount(&server)
        .await;

    let out = openai(&server)
        .complete(request(ResponseFormat::JsonSchema {
            name: "idea_analysis".into(),
            schema: json!({"type": "object"}),
        }))
        .await
        .unwrap();
    assert_eq!(out, "{\"ok\":true}");
}

#[tokio::test]
async fn refusal_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(chat_reply(json!({"role": "assistant", "content": null, "refusal": "I can't help with that"})))
        .mount(&server)
        .await;

    let err = openai(&server).complete(request(ResponseFormat::JsonObject)).await.unwrap_err();
    assert!(matches!(err, ProviderError::Refusal(ref m) if m == "I can't help with that"));
}

#[tokio::test]
async fn api_errors_carry_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = openai(&server).complete(request(ResponseFormat::Text)).await.unwrap_err();
    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(chat_reply(json!({"content": "late"})).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(server.uri(), "sk-test".into(), Duration::from_millis(50)).unwrap();
    let err = provider.complete(request(ResponseFormat::Text)).await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout));
}

#[tokio::test]
async fn ping_lists_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    openai(&server).ping().await.unwrap();
    assert_eq!(openai(&server).info().name, "openai");
}

#[tokio::test]
async fn training_file_is_uploaded_for_fine_tuning() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .and(body_string_contains("fine-tune"))
        .and(body_string_contains("training.jsonl"))
        .and(body_string_contains("{\"messages\":[]}"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-abc", "object": "file", "purpose": "fine-tune"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = openai(&server)
        .upload_training_file("training.jsonl", b"{\"messages\":[]}".to_vec())
        .await
        .unwrap();
    assert_eq!(id, "file-abc");
}

#[tokio::test]
async fn job_lifecycle_maps_provider_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fine_tuning/jobs"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini-2024-07-18",
            "training_file": "file-abc",
            "suffix": "idearadar",
            "hyperparameters": {"n_epochs": 3}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ftjob-1", "status": "validating_files",
            "fine_tuned_model": null, "trained_tokens": null, "error": null
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fine_tuning/jobs/ftjob-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ftjob-1", "status": "succeeded",
            "fine_tuned_model": "ft:gpt-4o-mini-2024-07-18:org:idearadar:abc",
            "trained_tokens": 48211, "error": {"message": null}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/fine_tuning/jobs/ftjob-1/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ftjob-1", "status": "cancelled",
            "fine_tuned_model": null, "trained_tokens": null, "error": null
        })))
        .mount(&server)
        .await;

    let provider = openai(&server);
    let created = provider
        .create_job(RemoteJobRequest {
            model: "gpt-4o-mini-2024-07-18".into(),
            training_file: "file-abc".into(),
            validation_file: None,
            hyperparameters: Some(Hyperparameters {
                n_epochs: Some(3),
                ..Hyperparameters::default()
            }),
            suffix: Some("idearadar".into()),
        })
        .await
        .unwrap();
    assert_eq!(created.id, "ftjob-1");
    assert_eq!(created.status, JobStatus::Queued);

    let done = provider.retrieve_job("ftjob-1").await.unwrap();
    assert_eq!(done.status, JobStatus::Succeeded);
    assert_eq!(done.trained_tokens, Some(48211));
    assert_eq!(done.fine_tuned_model.as_deref(), Some("ft:gpt-4o-mini-2024-07-18:org:idearadar:abc"));
    assert_eq!(done.error_message, None);

    let cancelled = provider.cancel_job("ftjob-1").await.unwrap();
    assert_eq!(cancelled.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn failed_job_reports_its_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fine_tuning/jobs/ftjob-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ftjob-9", "status": "failed", "fine_tuned_model": null,
            "error": {"code": "invalid_training_file", "message": "Line 3 is missing an assistant turn"}
        })))
        .mount(&server)
        .await;

    let job = openai(&server).retrieve_job("ftjob-9").await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("Line 3 is missing an assistant turn"));
}

#[tokio::test]
async fn gemini_generates_json_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(header("x-goog-api-key", "g-key"))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"score\": "}, {"text": "61}"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(server.uri(), "g-key".into(), Duration::from_secs(5)).unwrap();
    let mut req = request(ResponseFormat::JsonObject);
    req.model = "gemini-1.5-flash".into();
    assert_eq!(provider.complete(req).await.unwrap(), "{\"score\": 61}");
}

#[tokio::test]
async fn gemini_blocked_prompt_is_a_refusal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(server.uri(), "g-key".into(), Duration::from_secs(5)).unwrap();
    let mut req = request(ResponseFormat::JsonObject);
    req.model = "gemini-1.5-flash".into();
    assert!(matches!(provider.complete(req).await.unwrap_err(), ProviderError::Refusal(_)));
}
