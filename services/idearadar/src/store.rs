use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scoring::{IdeaAnalysis, QuickScore};
use uuid::Uuid;

use crate::types_ideas::IdeaRecord;
use crate::types_jobs::{FineTuningJobRecord, JobListFilter};
use crate::types_training::{
    CandidateFilter, EngagementMetrics, RecordPatch, RecordQuery, TrainingDataRecord,
    TrainingSnapshot, TrainingStats,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid update: {0}")]
    Invalid(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ideas are owned elsewhere; only scoring columns are written here.
#[async_trait]
pub trait IdeaStore: Send + Sync {
    async fn get_idea(&self, id: Uuid) -> StoreResult<Option<IdeaRecord>>;
    async fn save_analysis(&self, id: Uuid, analysis: &IdeaAnalysis) -> StoreResult<bool>;
    /// Writes score and summary only. The breakdown is left untouched.
    async fn save_quick_score(&self, id: Uuid, score: &QuickScore) -> StoreResult<bool>;
    /// Unscored ideas first, then (with `include_scored`) the longest since
    /// their last score.
    async fn rescore_candidates(&self, limit: i64, include_scored: bool) -> StoreResult<Vec<IdeaRecord>>;
    async fn set_idea_engagement(&self, id: Uuid, metrics: EngagementMetrics) -> StoreResult<bool>;
    async fn set_idea_comments_context(&self, id: Uuid, text: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait TrainingStore: Send + Sync {
    /// Insert or refresh the record for `idea_id`. Validation and training
    /// state of an existing record are never touched.
    async fn upsert_training(
        &self,
        idea_id: Uuid,
        snapshot: &TrainingSnapshot,
    ) -> StoreResult<TrainingDataRecord>;
    async fn get_training(&self, id: Uuid) -> StoreResult<Option<TrainingDataRecord>>;
    async fn get_training_by_idea(&self, idea_id: Uuid) -> StoreResult<Option<TrainingDataRecord>>;
    async fn update_training_engagement(
        &self,
        idea_id: Uuid,
        metrics: EngagementMetrics,
    ) -> StoreResult<Option<TrainingDataRecord>>;
    async fn set_training_comments_context(
        &self,
        idea_id: Uuid,
        text: &str,
    ) -> StoreResult<Option<TrainingDataRecord>>;
    /// Validated records only, most engaged first.
    async fn select_candidates(&self, filter: &CandidateFilter) -> StoreResult<Vec<TrainingDataRecord>>;
    async fn list_training(&self, query: &RecordQuery) -> StoreResult<(Vec<TrainingDataRecord>, i64)>;
    async fn patch_training(
        &self,
        id: Uuid,
        patch: &RecordPatch,
    ) -> StoreResult<Option<TrainingDataRecord>>;
    async fn delete_training(&self, id: Uuid) -> StoreResult<bool>;
    async fn mark_included(&self, ids: &[Uuid], job_id: Uuid, batch: &str) -> StoreResult<u64>;
    async fn training_stats(&self) -> StoreResult<TrainingStats>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: &FineTuningJobRecord) -> StoreResult<()>;
    async fn save_job(&self, job: &FineTuningJobRecord) -> StoreResult<()>;
    async fn get_job(&self, id: Uuid) -> StoreResult<Option<FineTuningJobRecord>>;
    /// Newest first.
    async fn list_jobs(&self, filter: &JobListFilter) -> StoreResult<Vec<FineTuningJobRecord>>;
    async fn latest_fine_tuned_model(&self) -> StoreResult<Option<String>>;
}

#[async_trait]
pub trait Store: IdeaStore + TrainingStore + JobStore {
    async fn ping(&self) -> StoreResult<()>;
}

/// Applies an admin patch to a loaded record, keeping the job-linkage
/// invariant: included records always carry a job id and batch.
pub fn apply_patch(
    record: &mut TrainingDataRecord,
    patch: &RecordPatch,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    if let Some(rating) = patch.quality_rating {
        if !(1..=5).contains(&rating) {
            return Err(StoreError::Invalid(format!(
                "quality_rating must be between 1 and 5, got {rating}"
            )));
        }
        record.quality_rating = Some(rating);
    }
    if let Some(validated) = patch.is_validated {
        record.is_validated = validated;
    }
    if let Some(source) = patch.validation_source {
        record.validation_source = Some(source);
    }
    match patch.included_in_training {
        Some(false) => {
            record.included_in_training = false;
            record.training_job_id = None;
            record.training_batch = None;
        }
        Some(true) if !record.included_in_training => {
            if record.training_job_id.is_none() || record.training_batch.is_none() {
                return Err(StoreError::Invalid(
                    "included_in_training can only be set by a fine-tuning job".into(),
                ));
            }
            record.included_in_training = true;
        }
        _ => {}
    }
    record.updated_at = now;
    Ok(())
}
