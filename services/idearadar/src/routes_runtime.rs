use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::config::{ScoringProvider, ScoringStrategy};
use crate::state::SharedState;

pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<Value>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok", "database": "ok" }))),
        Err(e) => {
            warn!(error = %e, "health check: database unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable" })),
            )
        }
    }
}

/// Which provider and model scoring currently uses.
pub async fn get_runtime(State(state): State<SharedState>) -> Json<Value> {
    let cfg = &state.config;
    let info = state.llm.info();

    let fine_tuned = if cfg.prefer_fine_tuned && cfg.scoring_provider == ScoringProvider::OpenAi {
        state.finetune.latest_fine_tuned_model().await.unwrap_or_else(|e| {
            warn!(error = %e, "fine-tuned model lookup failed");
            None
        })
    } else {
        None
    };
    let strategy = match (cfg.scoring_provider, cfg.scoring_strategy) {
        (ScoringProvider::Gemini, _) | (_, ScoringStrategy::JsonMode) => "json_mode",
        (_, ScoringStrategy::StrictSchema) => "strict_schema",
    };

    let active_model = fine_tuned.clone().unwrap_or_else(|| cfg.scoring_model.clone());

    Json(json!({
        "provider": info,
        "strategy": strategy,
        "base_model": cfg.scoring_model,
        "fine_tuned_model": fine_tuned,
        "active_model": active_model,
        "temperature": cfg.scoring_temperature,
        "finetune_base_model": cfg.finetune_base_model,
    }))
}
