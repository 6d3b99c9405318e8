use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use scoring::split_for_validation;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::ModelResolver;
use crate::dataset_validator::validate_chat_jsonl;
use crate::provider::{FineTuneProvider, ProviderError};
use crate::store::{JobStore, StoreError, TrainingStore};
use crate::training_export::{render_lines, TrainingExporter};
use crate::types_jobs::{
    CreateJobOptions, FineTuningJobRecord, JobListFilter, JobStatus, RemoteJobRequest,
};
use crate::types_training::{CandidateFilter, TrainingDataRecord};

/// Fewer candidates than this and no job is submitted.
pub const MIN_TRAINING_EXAMPLES: usize = 10;
/// Smaller validation slices are not uploaded.
pub const MIN_VALIDATION_EXAMPLES: usize = 10;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;
const MODEL_SUFFIX: &str = "idearadar";

#[derive(Debug, thiserror::Error)]
pub enum FineTuneError {
    #[error("insufficient training data: need {need}, have {have}")]
    InsufficientData { need: usize, have: usize },
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("fine-tuning job {0} not found")]
    NotFound(Uuid),
    #[error("training data failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to render training data: {0}")]
    Render(#[from] serde_json::Error),
}

/// Drives fine-tuning jobs from candidate selection to a trained model and
/// keeps the local job rows in step with the provider.
#[derive(Clone)]
pub struct FineTuneOrchestrator {
    exporter: TrainingExporter,
    training: Arc<dyn TrainingStore>,
    jobs: Arc<dyn JobStore>,
    provider: Arc<dyn FineTuneProvider>,
    default_base_model: String,
}

impl FineTuneOrchestrator {
    pub fn new<S>(store: Arc<S>, provider: Arc<dyn FineTuneProvider>, default_base_model: String) -> Self
    where
        S: TrainingStore + JobStore + 'static,
    {
        Self {
            exporter: TrainingExporter::new(store.clone()),
            training: store.clone(),
            jobs: store,
            provider,
            default_base_model,
        }
    }

    pub async fn create_job(&self, opts: CreateJobOptions) -> Result<FineTuningJobRecord, FineTuneError> {
        let split = opts.validation_split.unwrap_or(0.0);
        if !(0.0..1.0).contains(&split) {
            return Err(FineTuneError::InvalidOptions(format!(
                "validation_split must be in [0, 1), got {split}"
            )));
        }
        if let Some(q) = opts.min_quality_rating {
            if !(1..=5).contains(&q) {
                return Err(FineTuneError::InvalidOptions(format!(
                    "min_quality_rating must be between 1 and 5, got {q}"
                )));
            }
        }

        let filter = CandidateFilter {
            exclude_already_trained: true,
            min_engagement_score: opts.min_engagement_score,
            min_quality_rating: opts.min_quality_rating,
            limit: None,
        };
        let candidates = self.exporter.select_candidates(&filter).await?;
        if candidates.len() < MIN_TRAINING_EXAMPLES {
            return Err(FineTuneError::InsufficientData {
                need: MIN_TRAINING_EXAMPLES,
                have: candidates.len(),
            });
        }

        let base_model = opts
            .base_model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.default_base_model.clone());
        let mut job = FineTuningJobRecord::new(base_model, &opts, candidates.len());
        self.jobs.insert_job(&job).await?;
        info!(job_id = %job.id, candidates = candidates.len(), base_model = %job.base_model, "fine-tuning job created");

        match self.submit(&mut job, &candidates, split).await {
            Ok(()) => Ok(job),
            Err(e) => {
                self.record_failure(&mut job, &e).await;
                Err(e)
            }
        }
    }

    async fn submit(
        &self,
        job: &mut FineTuningJobRecord,
        candidates: &[TrainingDataRecord],
        split: f64,
    ) -> Result<(), FineTuneError> {
        // rendered from the same candidate set that passed the minimum check
        let lines = render_lines(candidates)?;
        let stats = validate_chat_jsonl(&lines).map_err(FineTuneError::Validation)?;
        for w in &stats.quality.warnings {
            warn!(job_id = %job.id, warning = %w, "training data quality");
        }
        info!(
            job_id = %job.id,
            examples = stats.examples,
            dataset_hash = %stats.dataset_hash,
            quality = stats.quality.score,
            "training data validated"
        );

        let (train, validation) = split_for_validation(&lines, split);

        let training_file_id = self
            .provider
            .upload_training_file(&format!("training-{}.jsonl", job.id), jsonl_bytes(&train))
            .await?;
        let validation_file_id = if validation.len() >= MIN_VALIDATION_EXAMPLES {
            let id = self
                .provider
                .upload_training_file(&format!("validation-{}.jsonl", job.id), jsonl_bytes(&validation))
                .await?;
            Some(id)
        } else {
            if !validation.is_empty() {
                info!(job_id = %job.id, lines = validation.len(), "validation slice too small; not uploaded");
            }
            None
        };

        job.training_file_id = Some(training_file_id.clone());
        job.validation_file_id = validation_file_id.clone();
        job.training_examples_count = train.len() as i32;
        job.validation_examples_count = validation.len() as i32;
        job.status = JobStatus::Queued;
        self.jobs.save_job(job).await?;
        info!(job_id = %job.id, training = train.len(), validation = validation.len(), "training files uploaded");

        let remote = self
            .provider
            .create_job(RemoteJobRequest {
                model: job.base_model.clone(),
                training_file: training_file_id,
                validation_file: validation_file_id,
                hyperparameters: job.hyperparameters.clone(),
                suffix: Some(MODEL_SUFFIX.to_string()),
            })
            .await?;

        let now = Utc::now();
        job.remote_job_id = Some(remote.id.clone());
        job.apply_remote(&remote, now);
        job.started_at = Some(now);
        self.jobs.save_job(job).await?;
        info!(job_id = %job.id, remote_job_id = %remote.id, status = %job.status, "fine-tuning job submitted");

        let ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
        let batch = format!("batch-{}", now.format("%Y-%m-%d"));
        let marked = self.training.mark_included(&ids, job.id, &batch).await?;
        info!(job_id = %job.id, marked, %batch, "training records consumed");
        Ok(())
    }

    /// Before a remote job exists the row is failed outright; afterwards the
    /// provider owns the status and only the reason is recorded.
    async fn record_failure(&self, job: &mut FineTuningJobRecord, err: &FineTuneError) {
        job.error_message = Some(err.to_string());
        if job.remote_job_id.is_none() {
            job.status = JobStatus::Failed;
            job.completed_at = Some(Utc::now());
        }
        warn!(job_id = %job.id, status = %job.status, error = %err, "fine-tuning job creation failed");
        if let Err(e) = self.jobs.save_job(job).await {
            warn!(job_id = %job.id, error = %e, "could not record job failure");
        }
    }

    pub async fn get_job(&self, id: Uuid) -> Result<Option<FineTuningJobRecord>, FineTuneError> {
        Ok(self.jobs.get_job(id).await?)
    }

    /// Reconciles the local row with the provider. `None` when the job is
    /// unknown or its status can't be fetched right now.
    pub async fn get_status(&self, id: Uuid) -> Option<FineTuningJobRecord> {
        match self.reconcile(id).await {
            Ok(job) => job,
            Err(e) => {
                warn!(job_id = %id, error = %e, "status reconciliation failed");
                None
            }
        }
    }

    async fn reconcile(&self, id: Uuid) -> Result<Option<FineTuningJobRecord>, FineTuneError> {
        let Some(mut job) = self.jobs.get_job(id).await? else {
            return Ok(None);
        };
        let Some(remote_id) = job.remote_job_id.clone() else {
            return Ok(Some(job));
        };

        let remote = self.provider.retrieve_job(&remote_id).await?;
        let before = job.status;
        job.apply_remote(&remote, Utc::now());
        self.jobs.save_job(&job).await?;
        if before != job.status {
            info!(job_id = %id, from = %before, to = %job.status, "job status reconciled");
        }
        Ok(Some(job))
    }

    pub async fn list_jobs(&self, filter: &JobListFilter) -> Result<Vec<FineTuningJobRecord>, FineTuneError> {
        let filter = JobListFilter {
            status: filter.status,
            limit: Some(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)),
        };
        Ok(self.jobs.list_jobs(&filter).await?)
    }

    /// `Ok(false)` when there is nothing to cancel remotely or the job already
    /// finished. Otherwise the row ends `cancelled` whatever the provider says;
    /// the next reconciliation corrects it if the provider disagrees.
    pub async fn cancel_job(&self, id: Uuid) -> Result<bool, FineTuneError> {
        let mut job = self.jobs.get_job(id).await?.ok_or(FineTuneError::NotFound(id))?;
        let Some(remote_id) = job.remote_job_id.clone() else {
            warn!(job_id = %id, "cancel requested for job without remote id");
            return Ok(false);
        };
        if !job.status.can_transition_to(JobStatus::Cancelled) {
            info!(job_id = %id, status = %job.status, "job already finished; nothing to cancel");
            return Ok(false);
        }

        let result = self.provider.cancel_job(&remote_id).await;

        job.status = JobStatus::Cancelled;
        job.completed_at = Some(Utc::now());
        self.jobs.save_job(&job).await?;

        match result {
            Ok(remote) => {
                info!(job_id = %id, remote_status = %remote.status, "job cancelled");
                Ok(true)
            }
            Err(e) => {
                warn!(job_id = %id, error = %e, "provider rejected cancellation; marked cancelled locally");
                Err(e.into())
            }
        }
    }

    pub async fn latest_fine_tuned_model(&self) -> Result<Option<String>, FineTuneError> {
        Ok(self.jobs.latest_fine_tuned_model().await?)
    }
}

#[async_trait]
impl ModelResolver for FineTuneOrchestrator {
    async fn fine_tuned_model(&self) -> Option<String> {
        match self.latest_fine_tuned_model().await {
            Ok(model) => model,
            Err(e) => {
                warn!(error = %e, "fine-tuned model lookup failed; using base model");
                None
            }
        }
    }
}

fn jsonl_bytes(lines: &[String]) -> Vec<u8> {
    lines.join("\n").into_bytes()
}
