use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a fine-tuning attempt:
/// `pending -> uploading -> queued -> running -> succeeded | failed | cancelled`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Uploading,
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Uploading => "uploading",
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => JobStatus::Pending,
            "uploading" => JobStatus::Uploading,
            "queued" => JobStatus::Queued,
            "running" => JobStatus::Running,
            "succeeded" => JobStatus::Succeeded,
            "failed" => JobStatus::Failed,
            "cancelled" => JobStatus::Cancelled,
            _ => return None,
        })
    }

    /// Maps a provider job status string onto the local lifecycle.
    /// Unknown values are treated as still queued.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "validating_files" | "queued" => JobStatus::Queued,
            "running" => JobStatus::Running,
            "succeeded" => JobStatus::Succeeded,
            "failed" => JobStatus::Failed,
            "cancelled" | "canceled" => JobStatus::Cancelled,
            _ => JobStatus::Queued,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Uploading => 1,
            JobStatus::Queued => 2,
            JobStatus::Running => 3,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled => 4,
        }
    }

    /// Local transitions only move forward and never leave a terminal state.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        !self.is_terminal() && next.rank() >= self.rank()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Passed through to the provider untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Hyperparameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_epochs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_rate_multiplier: Option<f64>,
}

impl Hyperparameters {
    pub fn is_empty(&self) -> bool {
        self.n_epochs.is_none() && self.batch_size.is_none() && self.learning_rate_multiplier.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FineTuningJobRecord {
    pub id: Uuid,
    pub remote_job_id: Option<String>,

    pub base_model: String,
    pub hyperparameters: Option<Hyperparameters>,
    pub notes: Option<String>,
    pub created_by: Option<String>,

    pub training_file_id: Option<String>,
    pub validation_file_id: Option<String>,

    pub training_examples_count: i32,
    pub validation_examples_count: i32,
    pub trained_tokens: Option<i64>,

    pub status: JobStatus,
    pub fine_tuned_model: Option<String>,
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl FineTuningJobRecord {
    pub fn new(base_model: String, opts: &CreateJobOptions, examples: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            remote_job_id: None,
            base_model,
            hyperparameters: opts.hyperparameters.clone().filter(|h| !h.is_empty()),
            notes: opts.notes.clone(),
            created_by: opts.created_by.clone(),
            training_file_id: None,
            validation_file_id: None,
            training_examples_count: examples as i32,
            validation_examples_count: 0,
            trained_tokens: None,
            status: JobStatus::Uploading,
            fine_tuned_model: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Overwrites local fields with what the provider reports. The provider is
    /// authoritative for remote state, so this also corrects an optimistic
    /// local cancel.
    pub fn apply_remote(&mut self, remote: &RemoteJob, now: DateTime<Utc>) {
        self.status = remote.status;
        if let Some(tokens) = remote.trained_tokens {
            self.trained_tokens = Some(tokens);
        }
        if let Some(model) = &remote.fine_tuned_model {
            self.fine_tuned_model = Some(model.clone());
        }
        if let Some(err) = &remote.error_message {
            self.error_message = Some(err.clone());
        }
        if remote.status.is_terminal() {
            self.completed_at.get_or_insert(now);
        } else {
            self.completed_at = None;
        }
    }
}

/// Admin request body for job creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateJobOptions {
    pub base_model: Option<String>,
    pub hyperparameters: Option<Hyperparameters>,
    pub validation_split: Option<f64>,
    pub min_engagement_score: Option<f64>,
    pub min_quality_rating: Option<i16>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobListFilter {
    pub status: Option<JobStatus>,
    pub limit: Option<i64>,
}

/// Provider-side view of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteJob {
    pub id: String,
    pub status: JobStatus,
    pub fine_tuned_model: Option<String>,
    pub trained_tokens: Option<i64>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoteJobRequest {
    pub model: String,
    pub training_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperparameters: Option<Hyperparameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}
