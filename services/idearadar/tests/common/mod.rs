#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use idearadar::config::AppConfig;
use idearadar::provider::{
    CompletionRequest, FineTuneProvider, LlmProvider, ProviderError, ProviderInfo,
};
use idearadar::store_memory::MemoryStore;
use idearadar::types_jobs::{JobStatus, RemoteJob, RemoteJobRequest};
use idearadar::types_training::{EngagementMetrics, TrainingDataRecord, ValidationSource};
use scoring::{IdeaAnalysis, ScoreBreakdown};

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub fn test_config(extra: &[(&str, &str)]) -> AppConfig {
    let mut env: HashMap<String, String> = [
        ("DATABASE_URL", "postgres://localhost/idearadar_test"),
        ("OPENAI_API_KEY", "sk-test"),
        ("ADMIN_TOKEN", ADMIN_TOKEN),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        env.insert(k.to_string(), v.to_string());
    }
    AppConfig::from_lookup(|k| env.get(k).cloned()).unwrap()
}

/// Language model that replays queued answers and records every request.
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
    pub delay: Option<Duration>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push_ok(&self, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(body.into()));
    }

    pub fn push_err(&self, err: ProviderError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn models_used(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.model.clone()).collect()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, req: CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(req);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Network("no scripted response".into())))
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "scripted".to_string(),
            base_url: "memory://".to_string(),
        }
    }
}

/// Fine-tuning provider kept entirely in memory.
#[derive(Default)]
pub struct ScriptedFineTune {
    /// (file name, file body) in upload order.
    pub uploads: Mutex<Vec<(String, String)>>,
    pub created: Mutex<Vec<RemoteJobRequest>>,
    pub cancelled: Mutex<Vec<String>>,
    pub remote_state: Mutex<Option<RemoteJob>>,
    pub fail_upload: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_retrieve: AtomicBool,
    pub fail_cancel: AtomicBool,
    next_id: AtomicUsize,
}

impl ScriptedFineTune {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_remote(&self, status: JobStatus, model: Option<&str>, error: Option<&str>) {
        let mut state = self.remote_state.lock().unwrap();
        let id = state.as_ref().map(|r| r.id.clone()).unwrap_or_else(|| "ftjob-1".into());
        *state = Some(RemoteJob {
            id,
            status,
            fine_tuned_model: model.map(str::to_string),
            trained_tokens: Some(12_345),
            error_message: error.map(str::to_string),
        });
    }

    pub fn upload_names(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }
}

fn unavailable() -> ProviderError {
    ProviderError::Api {
        status: 503,
        message: "provider unavailable".into(),
    }
}

#[async_trait]
impl FineTuneProvider for ScriptedFineTune {
    async fn upload_training_file(&self, name: &str, bytes: Vec<u8>) -> Result<String, ProviderError> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let body = String::from_utf8(bytes).map_err(|e| ProviderError::Parse(e.to_string()))?;
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((name.to_string(), body));
        Ok(format!("file-{}", uploads.len()))
    }

    async fn create_job(&self, req: RemoteJobRequest) -> Result<RemoteJob, ProviderError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.created.lock().unwrap().push(req);
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let job = RemoteJob {
            id: format!("ftjob-{n}"),
            status: JobStatus::from_provider("validating_files"),
            fine_tuned_model: None,
            trained_tokens: None,
            error_message: None,
        };
        *self.remote_state.lock().unwrap() = Some(job.clone());
        Ok(job)
    }

    async fn retrieve_job(&self, remote_id: &str) -> Result<RemoteJob, ProviderError> {
        if self.fail_retrieve.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let state = self.remote_state.lock().unwrap().clone();
        let mut job = state.ok_or_else(|| ProviderError::Api {
            status: 404,
            message: format!("no job {remote_id}"),
        })?;
        job.id = remote_id.to_string();
        Ok(job)
    }

    async fn cancel_job(&self, remote_id: &str) -> Result<RemoteJob, ProviderError> {
        self.cancelled.lock().unwrap().push(remote_id.to_string());
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(RemoteJob {
            id: remote_id.to_string(),
            status: JobStatus::Cancelled,
            fine_tuned_model: None,
            trained_tokens: None,
            error_message: None,
        })
    }
}

/// A validated, untrained record whose engagement score equals `upvotes`.
pub fn validated_record(title: &str, upvotes: i32) -> TrainingDataRecord {
    let now = Utc::now();
    let analysis = IdeaAnalysis::new(
        ScoreBreakdown::uniform(7),
        format!("{title} solves a real problem for a clear audience."),
        vec!["Clear pain point".into()],
        vec!["Crowded market".into()],
        "Small businesses".into(),
        vec!["Talk to ten customers".into()],
    );
    TrainingDataRecord {
        id: Uuid::new_v4(),
        idea_id: Uuid::new_v4(),
        idea_title: title.to_string(),
        idea_description: format!("{title}: a service that removes a recurring chore for busy teams"),
        idea_body: None,
        comments_context: None,
        score: i32::from(analysis.total_score),
        score_breakdown: Some(analysis.score_breakdown.clone()),
        ai_summary: Some(analysis.ai_summary.clone()),
        strengths: Some(analysis.strengths.clone()),
        challenges: Some(analysis.challenges.clone()),
        target_market: Some(analysis.target_market.clone()),
        suggested_next_steps: Some(analysis.suggested_next_steps.clone()),
        engagement: EngagementMetrics {
            upvotes,
            ..EngagementMetrics::default()
        },
        engagement_score: f64::from(upvotes),
        is_validated: true,
        validation_source: Some(ValidationSource::Manual),
        quality_rating: Some(4),
        included_in_training: false,
        training_job_id: None,
        training_batch: None,
        created_at: now - ChronoDuration::seconds(i64::from(upvotes)),
        updated_at: now,
    }
}

/// Seeds `n` validated records with engagement 1..=n; returns them in
/// insertion order.
pub async fn seed_validated(store: &MemoryStore, n: i32) -> Vec<TrainingDataRecord> {
    let mut out = Vec::new();
    for i in 1..=n {
        let rec = validated_record(&format!("Idea {i}"), i);
        store.insert_training(rec.clone()).await;
        out.push(rec);
    }
    out
}

pub fn analysis_json(score: i64) -> String {
    serde_json::json!({
        "score_breakdown": {
            "market_demand": score, "market_timing": score,
            "revenue_clarity": score, "scalability": score,
            "unique_value": score, "competitive_moat": score,
            "technical_feasibility": score, "execution_complexity": score,
            "market_risk": score, "regulatory_risk": score
        },
        "ai_summary": "A focused tool with a clear buyer.",
        "strengths": ["Clear buyer", "Simple to build", "Recurring revenue", "Extra"],
        "challenges": ["Distribution"],
        "target_market": "Independent landlords",
        "suggested_next_steps": ["Landing page"]
    })
    .to_string()
}
