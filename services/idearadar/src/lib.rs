//! IdeaRadar scoring service
//!
//! Scores startup ideas with a language model, curates the results as
//! training data and drives fine-tuning jobs for the scorer.

pub mod analysis;
pub mod auth;
pub mod config;
pub mod dataset_validator;
pub mod error;
pub mod finetune_job;
pub mod provider;
pub mod provider_gemini;
pub mod provider_openai;
pub mod routes_ideas;
pub mod routes_jobs;
pub mod routes_runtime;
pub mod routes_training;
pub mod scoring_service;
pub mod state;
pub mod store;
pub mod store_memory;
pub mod store_pg;
pub mod training_collector;
pub mod training_export;
pub mod types_ideas;
pub mod types_jobs;
pub mod types_training;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::SharedState;

/// Full HTTP surface. Everything except `/health` needs the admin token.
pub fn router(state: SharedState) -> Router {
    let admin = Router::new()
        .route(
            "/admin/fine-tuning/jobs",
            post(routes_jobs::create_job).get(routes_jobs::list_jobs),
        )
        .route(
            "/admin/fine-tuning/jobs/:id",
            get(routes_jobs::get_job).delete(routes_jobs::cancel_job),
        )
        .route("/admin/fine-tuning/latest-model", get(routes_jobs::latest_model))
        .route("/admin/training/records", get(routes_training::list_records))
        .route(
            "/admin/training/records/:id",
            patch(routes_training::patch_record).delete(routes_training::delete_record),
        )
        .route("/admin/training/stats", get(routes_training::stats))
        .route("/admin/training/export", get(routes_training::export))
        .route("/admin/ideas/rescore", post(routes_ideas::rescore))
        .route("/admin/runtime", get(routes_runtime::get_runtime))
        .route("/ideas/:id/score", post(routes_ideas::score_idea))
        .route("/ideas/:id/engagement", put(routes_ideas::put_engagement))
        .route("/ideas/:id/comments-context", put(routes_ideas::put_comments_context))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    Router::new()
        .route("/health", get(routes_runtime::health))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
