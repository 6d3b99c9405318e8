use axum::{
    extract::{Path, Query, State},
    Json,
};
use scoring::IdeaAnalysis;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::scoring_service::RescoreSummary;
use crate::state::SharedState;
use crate::types_training::EngagementMetrics;

const DEFAULT_RESCORE_LIMIT: i64 = 25;
const MAX_RESCORE_LIMIT: i64 = 200;

pub async fn score_idea(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IdeaAnalysis>, ApiError> {
    Ok(Json(state.scoring.score_idea(id).await?))
}

#[derive(Deserialize)]
pub struct RescoreParams {
    pub limit: Option<i64>,
    #[serde(default)]
    pub include_scored: bool,
}

pub async fn rescore(
    State(state): State<SharedState>,
    Query(params): Query<RescoreParams>,
) -> Result<Json<RescoreSummary>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RESCORE_LIMIT)
        .clamp(1, MAX_RESCORE_LIMIT);
    Ok(Json(state.scoring.bulk_rescore(limit, params.include_scored).await?))
}

pub async fn put_engagement(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(metrics): Json<EngagementMetrics>,
) -> Result<Json<Value>, ApiError> {
    if let Some(field) = metrics.negative_field() {
        return Err(ApiError::bad_request(format!("{field} must not be negative")));
    }
    if !state.ideas.set_idea_engagement(id, metrics).await? {
        return Err(ApiError::not_found(format!("idea {id} not found")));
    }
    let record = state.collector.update_engagement(id, metrics).await?;
    Ok(Json(json!({
        "idea_id": id,
        "training_record_updated": record.is_some(),
    })))
}

#[derive(Deserialize)]
pub struct CommentsContextBody {
    pub comments_context: String,
}

pub async fn put_comments_context(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CommentsContextBody>,
) -> Result<Json<Value>, ApiError> {
    let text = body.comments_context.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("comments_context must not be empty"));
    }
    if !state.ideas.set_idea_comments_context(id, text).await? {
        return Err(ApiError::not_found(format!("idea {id} not found")));
    }
    let record = state.collector.add_comments_context(id, text).await?;
    Ok(Json(json!({
        "idea_id": id,
        "training_record_updated": record.is_some(),
    })))
}
