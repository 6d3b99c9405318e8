use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::SharedState;
use crate::types_jobs::{CreateJobOptions, FineTuningJobRecord, JobListFilter, JobStatus};

#[derive(Serialize)]
pub struct JobCreatedResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub remote_job_id: Option<String>,
    pub training_examples_count: i32,
    pub validation_examples_count: i32,
}

pub async fn create_job(
    State(state): State<SharedState>,
    Json(opts): Json<CreateJobOptions>,
) -> Result<(StatusCode, Json<JobCreatedResponse>), ApiError> {
    let job = state.finetune.create_job(opts).await?;
    Ok((
        StatusCode::CREATED,
        Json(JobCreatedResponse {
            job_id: job.id,
            status: job.status,
            remote_job_id: job.remote_job_id,
            training_examples_count: job.training_examples_count,
            validation_examples_count: job.validation_examples_count,
        }),
    ))
}

#[derive(Deserialize)]
pub struct ListJobsParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_jobs(
    State(state): State<SharedState>,
    Query(params): Query<ListJobsParams>,
) -> Result<Json<Value>, ApiError> {
    let status = match params.status.as_deref() {
        None | Some("") => None,
        Some(s) => Some(
            JobStatus::parse(s).ok_or_else(|| ApiError::bad_request(format!("unknown status {s:?}")))?,
        ),
    };
    let jobs = state
        .finetune
        .list_jobs(&JobListFilter {
            status,
            limit: params.limit,
        })
        .await?;
    Ok(Json(json!({ "jobs": jobs })))
}

/// Reconciles with the provider before answering.
pub async fn get_job(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FineTuningJobRecord>, ApiError> {
    if state.finetune.get_job(id).await?.is_none() {
        return Err(ApiError::not_found(format!("fine-tuning job {id} not found")));
    }
    state
        .finetune
        .get_status(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "status unavailable"))
}

pub async fn cancel_job(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let success = state.finetune.cancel_job(id).await?;
    Ok(Json(json!({ "success": success })))
}

pub async fn latest_model(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let model = state.finetune.latest_fine_tuned_model().await?;
    Ok(Json(json!({ "model": model })))
}
