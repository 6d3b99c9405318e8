use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::SharedState;
use crate::types_training::{
    CandidateFilter, RecordPage, RecordPatch, RecordQuery, RecordSort, SortOrder,
    TrainingDataRecord, TrainingStats,
};

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Deserialize, Default)]
pub struct RecordsParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub validated: Option<bool>,
    pub trained: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl RecordsParams {
    fn into_query(self) -> Result<RecordQuery, ApiError> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::bad_request("page must be at least 1"));
        }
        let limit = self.limit.unwrap_or(20);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(ApiError::bad_request(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let sort_by = match self.sort_by.as_deref() {
            None => RecordSort::default(),
            Some("created_at") => RecordSort::CreatedAt,
            Some("updated_at") => RecordSort::UpdatedAt,
            Some("engagement_score") => RecordSort::EngagementScore,
            Some("score") => RecordSort::Score,
            Some(other) => return Err(ApiError::bad_request(format!("cannot sort by {other:?}"))),
        };
        let sort_order = match self.sort_order.as_deref() {
            None => SortOrder::default(),
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(other) => {
                return Err(ApiError::bad_request(format!("sort_order must be asc or desc, got {other:?}")))
            }
        };
        Ok(RecordQuery {
            page,
            limit,
            validated: self.validated,
            trained: self.trained,
            sort_by,
            sort_order,
        })
    }
}

pub async fn list_records(
    State(state): State<SharedState>,
    Query(params): Query<RecordsParams>,
) -> Result<Json<RecordPage>, ApiError> {
    let query = params.into_query()?;
    let (records, total) = state.training.list_training(&query).await?;
    Ok(Json(RecordPage::new(records, total, &query)))
}

pub async fn stats(State(state): State<SharedState>) -> Result<Json<TrainingStats>, ApiError> {
    Ok(Json(state.training.training_stats().await?))
}

pub async fn patch_record(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<RecordPatch>,
) -> Result<Json<TrainingDataRecord>, ApiError> {
    state
        .training
        .patch_training(id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("training record {id} not found")))
}

pub async fn delete_record(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !state.training.delete_training(id).await? {
        return Err(ApiError::not_found(format!("training record {id} not found")));
    }
    Ok(Json(json!({ "deleted": true })))
}

#[derive(Deserialize, Default)]
pub struct ExportParams {
    pub min_engagement: Option<f64>,
    pub min_quality: Option<i16>,
    pub exclude_trained: Option<bool>,
    pub limit: Option<i64>,
}

/// Chat-format JSONL download of validated records.
pub async fn export(
    State(state): State<SharedState>,
    Query(params): Query<ExportParams>,
) -> Result<(HeaderMap, String), ApiError> {
    let filter = CandidateFilter {
        exclude_already_trained: params.exclude_trained.unwrap_or(false),
        min_engagement_score: params.min_engagement,
        min_quality_rating: params.min_quality,
        limit: params.limit,
    };
    let body = state.exporter.export_jsonl(&filter).await?;

    let filename = format!("training-data-{}.jsonl", Utc::now().format("%Y-%m-%d"));
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/jsonl"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
    );
    Ok((headers, body))
}
