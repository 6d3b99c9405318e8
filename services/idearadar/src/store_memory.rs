use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use scoring::{IdeaAnalysis, QuickScore};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{apply_patch, IdeaStore, JobStore, Store, StoreResult, TrainingStore};
use crate::types_ideas::IdeaRecord;
use crate::types_jobs::{FineTuningJobRecord, JobListFilter, JobStatus};
use crate::types_training::{
    CandidateFilter, EngagementMetrics, RecordPatch, RecordQuery, RecordSort, SortOrder,
    TrainingDataRecord, TrainingSnapshot, TrainingStats,
};

/// In-process store (for tests and demos). Same semantics as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    ideas: RwLock<HashMap<Uuid, IdeaRecord>>,
    training: RwLock<HashMap<Uuid, TrainingDataRecord>>,
    jobs: RwLock<HashMap<Uuid, FineTuningJobRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_idea(&self, idea: IdeaRecord) {
        self.ideas.write().await.insert(idea.id, idea);
    }

    /// Seeds a record as-is, recomputing only the engagement score.
    pub async fn insert_training(&self, mut record: TrainingDataRecord) {
        record.engagement_score = record.engagement.engagement_score();
        self.training.write().await.insert(record.id, record);
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

fn by_engagement_desc(a: &TrainingDataRecord, b: &TrainingDataRecord) -> Ordering {
    b.engagement_score
        .partial_cmp(&a.engagement_score)
        .unwrap_or(Ordering::Equal)
        .then(a.created_at.cmp(&b.created_at))
        .then(a.id.cmp(&b.id))
}

fn by_column(sort: RecordSort, a: &TrainingDataRecord, b: &TrainingDataRecord) -> Ordering {
    match sort {
        RecordSort::CreatedAt => a.created_at.cmp(&b.created_at),
        RecordSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        RecordSort::EngagementScore => a
            .engagement_score
            .partial_cmp(&b.engagement_score)
            .unwrap_or(Ordering::Equal),
        RecordSort::Score => a.score.cmp(&b.score),
    }
}

fn refresh_from_snapshot(record: &mut TrainingDataRecord, snapshot: &TrainingSnapshot) {
    record.idea_title = snapshot.title.clone();
    record.idea_description = snapshot.description.clone();
    record.idea_body = snapshot.body.clone();
    if snapshot.comments_context.is_some() {
        record.comments_context = snapshot.comments_context.clone();
    }
    record.score = snapshot.score;
    let analysis = snapshot.analysis.as_ref();
    record.score_breakdown = analysis.map(|a| a.score_breakdown.clone());
    record.ai_summary = analysis.map(|a| a.ai_summary.clone());
    record.strengths = analysis.map(|a| a.strengths.clone());
    record.challenges = analysis.map(|a| a.challenges.clone());
    record.target_market = analysis.map(|a| a.target_market.clone());
    record.suggested_next_steps = analysis.map(|a| a.suggested_next_steps.clone());
    record.engagement = snapshot.engagement;
    record.engagement_score = snapshot.engagement.engagement_score();
}

#[async_trait]
impl IdeaStore for MemoryStore {
    async fn get_idea(&self, id: Uuid) -> StoreResult<Option<IdeaRecord>> {
        Ok(self.ideas.read().await.get(&id).cloned())
    }

    async fn save_analysis(&self, id: Uuid, analysis: &IdeaAnalysis) -> StoreResult<bool> {
        let mut ideas = self.ideas.write().await;
        let Some(idea) = ideas.get_mut(&id) else {
            return Ok(false);
        };
        idea.score = Some(i32::from(analysis.total_score));
        idea.score_breakdown = Some(analysis.score_breakdown.clone());
        idea.ai_summary = Some(analysis.ai_summary.clone());
        idea.scored_at = Some(Utc::now());
        Ok(true)
    }

    async fn save_quick_score(&self, id: Uuid, score: &QuickScore) -> StoreResult<bool> {
        let mut ideas = self.ideas.write().await;
        let Some(idea) = ideas.get_mut(&id) else {
            return Ok(false);
        };
        idea.score = Some(i32::from(score.score));
        idea.ai_summary = Some(score.summary.clone());
        idea.scored_at = Some(Utc::now());
        Ok(true)
    }

    async fn rescore_candidates(&self, limit: i64, include_scored: bool) -> StoreResult<Vec<IdeaRecord>> {
        let ideas = self.ideas.read().await;
        let mut out: Vec<IdeaRecord> = ideas
            .values()
            .filter(|i| include_scored || i.score.is_none())
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.scored_at
                .cmp(&b.scored_at)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        out.truncate(limit.max(0) as usize);
        Ok(out)
    }

    async fn set_idea_engagement(&self, id: Uuid, metrics: EngagementMetrics) -> StoreResult<bool> {
        let mut ideas = self.ideas.write().await;
        Ok(match ideas.get_mut(&id) {
            Some(idea) => {
                idea.engagement = metrics;
                true
            }
            None => false,
        })
    }

    async fn set_idea_comments_context(&self, id: Uuid, text: &str) -> StoreResult<bool> {
        let mut ideas = self.ideas.write().await;
        Ok(match ideas.get_mut(&id) {
            Some(idea) => {
                idea.comments_context = Some(text.to_string());
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl TrainingStore for MemoryStore {
    async fn upsert_training(
        &self,
        idea_id: Uuid,
        snapshot: &TrainingSnapshot,
    ) -> StoreResult<TrainingDataRecord> {
        let mut training = self.training.write().await;
        let now = Utc::now();

        if let Some(existing) = training.values_mut().find(|r| r.idea_id == idea_id) {
            refresh_from_snapshot(existing, snapshot);
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let mut record = TrainingDataRecord {
            id: Uuid::new_v4(),
            idea_id,
            idea_title: String::new(),
            idea_description: String::new(),
            idea_body: None,
            comments_context: None,
            score: 0,
            score_breakdown: None,
            ai_summary: None,
            strengths: None,
            challenges: None,
            target_market: None,
            suggested_next_steps: None,
            engagement: EngagementMetrics::default(),
            engagement_score: 0.0,
            is_validated: false,
            validation_source: None,
            quality_rating: None,
            included_in_training: false,
            training_job_id: None,
            training_batch: None,
            created_at: now,
            updated_at: now,
        };
        refresh_from_snapshot(&mut record, snapshot);
        training.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_training(&self, id: Uuid) -> StoreResult<Option<TrainingDataRecord>> {
        Ok(self.training.read().await.get(&id).cloned())
    }

    async fn get_training_by_idea(&self, idea_id: Uuid) -> StoreResult<Option<TrainingDataRecord>> {
        Ok(self
            .training
            .read()
            .await
            .values()
            .find(|r| r.idea_id == idea_id)
            .cloned())
    }

    async fn update_training_engagement(
        &self,
        idea_id: Uuid,
        metrics: EngagementMetrics,
    ) -> StoreResult<Option<TrainingDataRecord>> {
        let mut training = self.training.write().await;
        Ok(training.values_mut().find(|r| r.idea_id == idea_id).map(|r| {
            r.engagement = metrics;
            r.engagement_score = metrics.engagement_score();
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn set_training_comments_context(
        &self,
        idea_id: Uuid,
        text: &str,
    ) -> StoreResult<Option<TrainingDataRecord>> {
        let mut training = self.training.write().await;
        Ok(training.values_mut().find(|r| r.idea_id == idea_id).map(|r| {
            r.comments_context = Some(text.to_string());
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn select_candidates(&self, filter: &CandidateFilter) -> StoreResult<Vec<TrainingDataRecord>> {
        let training = self.training.read().await;
        let mut out: Vec<TrainingDataRecord> = training
            .values()
            .filter(|r| r.is_validated)
            .filter(|r| !(filter.exclude_already_trained && r.included_in_training))
            .filter(|r| filter.min_engagement_score.map_or(true, |m| r.engagement_score >= m))
            .filter(|r| {
                filter
                    .min_quality_rating
                    .map_or(true, |m| r.quality_rating.is_some_and(|q| q >= m))
            })
            .cloned()
            .collect();
        out.sort_by(by_engagement_desc);
        if let Some(limit) = filter.limit {
            out.truncate(limit.max(0) as usize);
        }
        Ok(out)
    }

    async fn list_training(&self, query: &RecordQuery) -> StoreResult<(Vec<TrainingDataRecord>, i64)> {
        let training = self.training.read().await;
        let mut matched: Vec<TrainingDataRecord> = training
            .values()
            .filter(|r| query.validated.map_or(true, |v| r.is_validated == v))
            .filter(|r| query.trained.map_or(true, |t| r.included_in_training == t))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            let ord = by_column(query.sort_by, a, b).then(a.id.cmp(&b.id));
            match query.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn patch_training(
        &self,
        id: Uuid,
        patch: &RecordPatch,
    ) -> StoreResult<Option<TrainingDataRecord>> {
        let mut training = self.training.write().await;
        let Some(record) = training.get_mut(&id) else {
            return Ok(None);
        };
        let mut updated = record.clone();
        apply_patch(&mut updated, patch, Utc::now())?;
        *record = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_training(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.training.write().await.remove(&id).is_some())
    }

    async fn mark_included(&self, ids: &[Uuid], job_id: Uuid, batch: &str) -> StoreResult<u64> {
        let mut training = self.training.write().await;
        let now = Utc::now();
        let mut n = 0;
        for id in ids {
            if let Some(r) = training.get_mut(id) {
                r.included_in_training = true;
                r.training_job_id = Some(job_id);
                r.training_batch = Some(batch.to_string());
                r.updated_at = now;
                n += 1;
            }
        }
        Ok(n)
    }

    async fn training_stats(&self) -> StoreResult<TrainingStats> {
        let training = self.training.read().await;
        let total = training.len() as i64;
        let count = |f: &dyn Fn(&TrainingDataRecord) -> bool| {
            training.values().filter(|&r| f(r)).count() as i64
        };
        let average_score = (total > 0)
            .then(|| training.values().map(|r| f64::from(r.score)).sum::<f64>() / total as f64);
        Ok(TrainingStats {
            total,
            validated: count(&|r| r.is_validated),
            included_in_training: count(&|r| r.included_in_training),
            ready_for_training: count(&|r| r.is_validated && !r.included_in_training),
            average_score,
        })
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: &FineTuningJobRecord) -> StoreResult<()> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn save_job(&self, job: &FineTuningJobRecord) -> StoreResult<()> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<FineTuningJobRecord>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn list_jobs(&self, filter: &JobListFilter) -> StoreResult<Vec<FineTuningJobRecord>> {
        let jobs = self.jobs.read().await;
        let mut out: Vec<FineTuningJobRecord> = jobs
            .values()
            .filter(|j| filter.status.map_or(true, |s| j.status == s))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            out.truncate(limit.max(0) as usize);
        }
        Ok(out)
    }

    async fn latest_fine_tuned_model(&self) -> StoreResult<Option<String>> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .values()
            .filter(|j| j.status == JobStatus::Succeeded && j.fine_tuned_model.is_some())
            .max_by(|a, b| {
                a.completed_at
                    .cmp(&b.completed_at)
                    .then(a.created_at.cmp(&b.created_at))
            })
            .and_then(|j| j.fine_tuned_model.clone()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
