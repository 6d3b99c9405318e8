use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scoring::{IdeaAnalysis, QuickScore, ScoreBreakdown};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::store::{apply_patch, IdeaStore, JobStore, Store, StoreError, StoreResult, TrainingStore};
use crate::types_ideas::IdeaRecord;
use crate::types_jobs::{FineTuningJobRecord, Hyperparameters, JobListFilter, JobStatus};
use crate::types_training::{
    CandidateFilter, EngagementMetrics, RecordPatch, RecordQuery, SortOrder, TrainingDataRecord,
    TrainingSnapshot, TrainingStats, ValidationSource,
};

const IDEA_COLUMNS: &str = "id, title, description, body, source_forum, source_community, \
    upvotes, downvotes, comments_count, bookmarks_count, comments_context, \
    score, score_breakdown, ai_summary, scored_at, created_at";

const TRAINING_COLUMNS: &str = "id, idea_id, idea_title, idea_description, idea_body, comments_context, \
    score, score_breakdown, ai_summary, strengths, challenges, target_market, suggested_next_steps, \
    upvotes, downvotes, comments_count, bookmarks_count, engagement_score, \
    is_validated, validation_source, quality_rating, \
    included_in_training, training_job_id, training_batch, created_at, updated_at";

const JOB_COLUMNS: &str = "id, remote_job_id, base_model, hyperparameters, notes, created_by, \
    training_file_id, validation_file_id, training_examples_count, validation_examples_count, \
    trained_tokens, status, fine_tuned_model, error_message, created_at, started_at, completed_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct IdeaRow {
    id: Uuid,
    title: String,
    description: String,
    body: Option<String>,
    source_forum: Option<String>,
    source_community: Option<String>,
    upvotes: i32,
    downvotes: i32,
    comments_count: i32,
    bookmarks_count: i32,
    comments_context: Option<String>,
    score: Option<i32>,
    score_breakdown: Option<Json<ScoreBreakdown>>,
    ai_summary: Option<String>,
    scored_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<IdeaRow> for IdeaRecord {
    fn from(r: IdeaRow) -> Self {
        IdeaRecord {
            id: r.id,
            title: r.title,
            description: r.description,
            body: r.body,
            source_forum: r.source_forum,
            source_community: r.source_community,
            engagement: EngagementMetrics {
                upvotes: r.upvotes,
                downvotes: r.downvotes,
                comments_count: r.comments_count,
                bookmarks_count: r.bookmarks_count,
            },
            comments_context: r.comments_context,
            score: r.score,
            score_breakdown: r.score_breakdown.map(|j| j.0),
            ai_summary: r.ai_summary,
            scored_at: r.scored_at,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TrainingRow {
    id: Uuid,
    idea_id: Uuid,
    idea_title: String,
    idea_description: String,
    idea_body: Option<String>,
    comments_context: Option<String>,
    score: i32,
    score_breakdown: Option<Json<ScoreBreakdown>>,
    ai_summary: Option<String>,
    strengths: Option<Json<Vec<String>>>,
    challenges: Option<Json<Vec<String>>>,
    target_market: Option<String>,
    suggested_next_steps: Option<Json<Vec<String>>>,
    upvotes: i32,
    downvotes: i32,
    comments_count: i32,
    bookmarks_count: i32,
    engagement_score: f64,
    is_validated: bool,
    validation_source: Option<String>,
    quality_rating: Option<i16>,
    included_in_training: bool,
    training_job_id: Option<Uuid>,
    training_batch: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TrainingRow> for TrainingDataRecord {
    type Error = StoreError;

    fn try_from(r: TrainingRow) -> Result<Self, Self::Error> {
        let validation_source = match r.validation_source.as_deref() {
            None => None,
            Some(s) => Some(
                ValidationSource::parse(s)
                    .ok_or_else(|| StoreError::Corrupt(format!("validation_source {s:?}")))?,
            ),
        };
        Ok(TrainingDataRecord {
            id: r.id,
            idea_id: r.idea_id,
            idea_title: r.idea_title,
            idea_description: r.idea_description,
            idea_body: r.idea_body,
            comments_context: r.comments_context,
            score: r.score,
            score_breakdown: r.score_breakdown.map(|j| j.0),
            ai_summary: r.ai_summary,
            strengths: r.strengths.map(|j| j.0),
            challenges: r.challenges.map(|j| j.0),
            target_market: r.target_market,
            suggested_next_steps: r.suggested_next_steps.map(|j| j.0),
            engagement: EngagementMetrics {
                upvotes: r.upvotes,
                downvotes: r.downvotes,
                comments_count: r.comments_count,
                bookmarks_count: r.bookmarks_count,
            },
            engagement_score: r.engagement_score,
            is_validated: r.is_validated,
            validation_source,
            quality_rating: r.quality_rating,
            included_in_training: r.included_in_training,
            training_job_id: r.training_job_id,
            training_batch: r.training_batch,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn training_records(rows: Vec<TrainingRow>) -> StoreResult<Vec<TrainingDataRecord>> {
    rows.into_iter().map(TrainingDataRecord::try_from).collect()
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    remote_job_id: Option<String>,
    base_model: String,
    hyperparameters: Option<Json<Hyperparameters>>,
    notes: Option<String>,
    created_by: Option<String>,
    training_file_id: Option<String>,
    validation_file_id: Option<String>,
    training_examples_count: i32,
    validation_examples_count: i32,
    trained_tokens: Option<i64>,
    status: String,
    fine_tuned_model: Option<String>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for FineTuningJobRecord {
    type Error = StoreError;

    fn try_from(r: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&r.status)
            .ok_or_else(|| StoreError::Corrupt(format!("job status {:?}", r.status)))?;
        Ok(FineTuningJobRecord {
            id: r.id,
            remote_job_id: r.remote_job_id,
            base_model: r.base_model,
            hyperparameters: r.hyperparameters.map(|j| j.0),
            notes: r.notes,
            created_by: r.created_by,
            training_file_id: r.training_file_id,
            validation_file_id: r.validation_file_id,
            training_examples_count: r.training_examples_count,
            validation_examples_count: r.validation_examples_count,
            trained_tokens: r.trained_tokens,
            status,
            fine_tuned_model: r.fine_tuned_model,
            error_message: r.error_message,
            created_at: r.created_at,
            started_at: r.started_at,
            completed_at: r.completed_at,
        })
    }
}

#[async_trait]
impl IdeaStore for PgStore {
    async fn get_idea(&self, id: Uuid) -> StoreResult<Option<IdeaRecord>> {
        let sql = format!("SELECT {IDEA_COLUMNS} FROM ideas WHERE id = $1");
        let row = sqlx::query_as::<_, IdeaRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(IdeaRecord::from))
    }

    async fn save_analysis(&self, id: Uuid, analysis: &IdeaAnalysis) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE ideas SET
                score = $2,
                score_breakdown = $3,
                ai_summary = $4,
                strengths = $5,
                challenges = $6,
                target_market = $7,
                suggested_next_steps = $8,
                scored_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(i32::from(analysis.total_score))
        .bind(Json(&analysis.score_breakdown))
        .bind(&analysis.ai_summary)
        .bind(Json(&analysis.strengths))
        .bind(Json(&analysis.challenges))
        .bind(&analysis.target_market)
        .bind(Json(&analysis.suggested_next_steps))
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn save_quick_score(&self, id: Uuid, score: &QuickScore) -> StoreResult<bool> {
        let res = sqlx::query(
            "UPDATE ideas SET score = $2, ai_summary = $3, scored_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(i32::from(score.score))
        .bind(&score.summary)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn rescore_candidates(&self, limit: i64, include_scored: bool) -> StoreResult<Vec<IdeaRecord>> {
        let sql = format!(
            "SELECT {IDEA_COLUMNS} FROM ideas WHERE ($2 OR score IS NULL) \
             ORDER BY scored_at NULLS FIRST, created_at, id LIMIT $1"
        );
        let rows = sqlx::query_as::<_, IdeaRow>(&sql)
            .bind(limit)
            .bind(include_scored)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(IdeaRecord::from).collect())
    }

    async fn set_idea_engagement(&self, id: Uuid, metrics: EngagementMetrics) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE ideas SET upvotes = $2, downvotes = $3, comments_count = $4, bookmarks_count = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(metrics.upvotes)
        .bind(metrics.downvotes)
        .bind(metrics.comments_count)
        .bind(metrics.bookmarks_count)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_idea_comments_context(&self, id: Uuid, text: &str) -> StoreResult<bool> {
        let res = sqlx::query("UPDATE ideas SET comments_context = $2 WHERE id = $1")
            .bind(id)
            .bind(text)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

fn push_record_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &RecordQuery) {
    if let Some(v) = query.validated {
        qb.push(" AND is_validated = ").push_bind(v);
    }
    if let Some(t) = query.trained {
        qb.push(" AND included_in_training = ").push_bind(t);
    }
}

#[async_trait]
impl TrainingStore for PgStore {
    async fn upsert_training(
        &self,
        idea_id: Uuid,
        snapshot: &TrainingSnapshot,
    ) -> StoreResult<TrainingDataRecord> {
        let a = snapshot.analysis.as_ref();
        let sql = format!(
            r#"
            INSERT INTO training_data (
                id, idea_id, idea_title, idea_description, idea_body, comments_context,
                score, score_breakdown, ai_summary, strengths, challenges, target_market,
                suggested_next_steps, upvotes, downvotes, comments_count, bookmarks_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (idea_id) DO UPDATE SET
                idea_title = EXCLUDED.idea_title,
                idea_description = EXCLUDED.idea_description,
                idea_body = EXCLUDED.idea_body,
                comments_context = COALESCE(EXCLUDED.comments_context, training_data.comments_context),
                score = EXCLUDED.score,
                score_breakdown = EXCLUDED.score_breakdown,
                ai_summary = EXCLUDED.ai_summary,
                strengths = EXCLUDED.strengths,
                challenges = EXCLUDED.challenges,
                target_market = EXCLUDED.target_market,
                suggested_next_steps = EXCLUDED.suggested_next_steps,
                upvotes = EXCLUDED.upvotes,
                downvotes = EXCLUDED.downvotes,
                comments_count = EXCLUDED.comments_count,
                bookmarks_count = EXCLUDED.bookmarks_count,
                updated_at = NOW()
            RETURNING {TRAINING_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TrainingRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(idea_id)
            .bind(&snapshot.title)
            .bind(&snapshot.description)
            .bind(&snapshot.body)
            .bind(&snapshot.comments_context)
            .bind(snapshot.score)
            .bind(a.map(|a| Json(&a.score_breakdown)))
            .bind(a.map(|a| &a.ai_summary))
            .bind(a.map(|a| Json(&a.strengths)))
            .bind(a.map(|a| Json(&a.challenges)))
            .bind(a.map(|a| &a.target_market))
            .bind(a.map(|a| Json(&a.suggested_next_steps)))
            .bind(snapshot.engagement.upvotes)
            .bind(snapshot.engagement.downvotes)
            .bind(snapshot.engagement.comments_count)
            .bind(snapshot.engagement.bookmarks_count)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn get_training(&self, id: Uuid) -> StoreResult<Option<TrainingDataRecord>> {
        let sql = format!("SELECT {TRAINING_COLUMNS} FROM training_data WHERE id = $1");
        let row = sqlx::query_as::<_, TrainingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TrainingDataRecord::try_from).transpose()
    }

    async fn get_training_by_idea(&self, idea_id: Uuid) -> StoreResult<Option<TrainingDataRecord>> {
        let sql = format!("SELECT {TRAINING_COLUMNS} FROM training_data WHERE idea_id = $1");
        let row = sqlx::query_as::<_, TrainingRow>(&sql)
            .bind(idea_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TrainingDataRecord::try_from).transpose()
    }

    async fn update_training_engagement(
        &self,
        idea_id: Uuid,
        metrics: EngagementMetrics,
    ) -> StoreResult<Option<TrainingDataRecord>> {
        let sql = format!(
            r#"
            UPDATE training_data SET
                upvotes = $2, downvotes = $3, comments_count = $4, bookmarks_count = $5,
                updated_at = NOW()
            WHERE idea_id = $1
            RETURNING {TRAINING_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TrainingRow>(&sql)
            .bind(idea_id)
            .bind(metrics.upvotes)
            .bind(metrics.downvotes)
            .bind(metrics.comments_count)
            .bind(metrics.bookmarks_count)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TrainingDataRecord::try_from).transpose()
    }

    async fn set_training_comments_context(
        &self,
        idea_id: Uuid,
        text: &str,
    ) -> StoreResult<Option<TrainingDataRecord>> {
        let sql = format!(
            "UPDATE training_data SET comments_context = $2, updated_at = NOW() \
             WHERE idea_id = $1 RETURNING {TRAINING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TrainingRow>(&sql)
            .bind(idea_id)
            .bind(text)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TrainingDataRecord::try_from).transpose()
    }

    async fn select_candidates(&self, filter: &CandidateFilter) -> StoreResult<Vec<TrainingDataRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TRAINING_COLUMNS} FROM training_data WHERE is_validated"
        ));
        if filter.exclude_already_trained {
            qb.push(" AND NOT included_in_training");
        }
        if let Some(min) = filter.min_engagement_score {
            qb.push(" AND engagement_score >= ").push_bind(min);
        }
        if let Some(min) = filter.min_quality_rating {
            qb.push(" AND quality_rating >= ").push_bind(min);
        }
        qb.push(" ORDER BY engagement_score DESC, created_at ASC, id ASC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit.max(0));
        }
        let rows = qb.build_query_as::<TrainingRow>().fetch_all(&self.pool).await?;
        training_records(rows)
    }

    async fn list_training(&self, query: &RecordQuery) -> StoreResult<(Vec<TrainingDataRecord>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM training_data WHERE TRUE");
        push_record_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let order = match query.sort_order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TRAINING_COLUMNS} FROM training_data WHERE TRUE"
        ));
        push_record_filters(&mut qb, query);
        qb.push(format!(" ORDER BY {} {order}, id {order}", query.sort_by.column()));
        qb.push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset());
        let rows = qb.build_query_as::<TrainingRow>().fetch_all(&self.pool).await?;
        Ok((training_records(rows)?, total))
    }

    async fn patch_training(
        &self,
        id: Uuid,
        patch: &RecordPatch,
    ) -> StoreResult<Option<TrainingDataRecord>> {
        let mut tx = self.pool.begin().await?;
        let select = format!("SELECT {TRAINING_COLUMNS} FROM training_data WHERE id = $1 FOR UPDATE");
        let Some(row) = sqlx::query_as::<_, TrainingRow>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        let mut record = TrainingDataRecord::try_from(row)?;
        apply_patch(&mut record, patch, Utc::now())?;

        let update = format!(
            r#"
            UPDATE training_data SET
                is_validated = $2,
                validation_source = $3,
                quality_rating = $4,
                included_in_training = $5,
                training_job_id = $6,
                training_batch = $7,
                updated_at = $8
            WHERE id = $1
            RETURNING {TRAINING_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TrainingRow>(&update)
            .bind(id)
            .bind(record.is_validated)
            .bind(record.validation_source.map(|s| s.as_str()))
            .bind(record.quality_rating)
            .bind(record.included_in_training)
            .bind(record.training_job_id)
            .bind(&record.training_batch)
            .bind(record.updated_at)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        TrainingDataRecord::try_from(row).map(Some)
    }

    async fn delete_training(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM training_data WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn mark_included(&self, ids: &[Uuid], job_id: Uuid, batch: &str) -> StoreResult<u64> {
        let res = sqlx::query(
            r#"
            UPDATE training_data SET
                included_in_training = TRUE,
                training_job_id = $1,
                training_batch = $2,
                updated_at = NOW()
            WHERE id = ANY($3)
            "#,
        )
        .bind(job_id)
        .bind(batch)
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    async fn training_stats(&self) -> StoreResult<TrainingStats> {
        let (total, validated, included_in_training, ready_for_training, average_score): (
            i64,
            i64,
            i64,
            i64,
            Option<f64>,
        ) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE is_validated),
                COUNT(*) FILTER (WHERE included_in_training),
                COUNT(*) FILTER (WHERE is_validated AND NOT included_in_training),
                AVG(score)::DOUBLE PRECISION
            FROM training_data
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(TrainingStats {
            total,
            validated,
            included_in_training,
            ready_for_training,
            average_score,
        })
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn insert_job(&self, job: &FineTuningJobRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO fine_tuning_jobs (
                id, remote_job_id, base_model, hyperparameters, notes, created_by,
                training_file_id, validation_file_id, training_examples_count,
                validation_examples_count, trained_tokens, status, fine_tuned_model,
                error_message, created_at, started_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(job.id)
        .bind(&job.remote_job_id)
        .bind(&job.base_model)
        .bind(job.hyperparameters.as_ref().map(Json))
        .bind(&job.notes)
        .bind(&job.created_by)
        .bind(&job.training_file_id)
        .bind(&job.validation_file_id)
        .bind(job.training_examples_count)
        .bind(job.validation_examples_count)
        .bind(job.trained_tokens)
        .bind(job.status.as_str())
        .bind(&job.fine_tuned_model)
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_job(&self, job: &FineTuningJobRecord) -> StoreResult<()> {
        let res = sqlx::query(
            r#"
            UPDATE fine_tuning_jobs SET
                remote_job_id = $2,
                training_file_id = $3,
                validation_file_id = $4,
                training_examples_count = $5,
                validation_examples_count = $6,
                trained_tokens = $7,
                status = $8,
                fine_tuned_model = $9,
                error_message = $10,
                started_at = $11,
                completed_at = $12
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(&job.remote_job_id)
        .bind(&job.training_file_id)
        .bind(&job.validation_file_id)
        .bind(job.training_examples_count)
        .bind(job.validation_examples_count)
        .bind(job.trained_tokens)
        .bind(job.status.as_str())
        .bind(&job.fine_tuned_model)
        .bind(&job.error_message)
        .bind(job.started_at)
        .bind(job.completed_at)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("fine-tuning job {}", job.id)));
        }
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<FineTuningJobRecord>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM fine_tuning_jobs WHERE id = $1");
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(FineTuningJobRecord::try_from).transpose()
    }

    async fn list_jobs(&self, filter: &JobListFilter) -> StoreResult<Vec<FineTuningJobRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {JOB_COLUMNS} FROM fine_tuning_jobs WHERE TRUE"
        ));
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY created_at DESC, id DESC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit.max(0));
        }
        let rows = qb.build_query_as::<JobRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(FineTuningJobRecord::try_from).collect()
    }

    async fn latest_fine_tuned_model(&self) -> StoreResult<Option<String>> {
        let model = sqlx::query_scalar::<_, String>(
            r#"
            SELECT fine_tuned_model FROM fine_tuning_jobs
            WHERE status = 'succeeded' AND fine_tuned_model IS NOT NULL
            ORDER BY completed_at DESC NULLS LAST, created_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(model)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
