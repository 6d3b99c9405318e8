use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::finetune_job::FineTuneError;
use crate::scoring_service::ScoringError;
use crate::store::StoreError;
use crate::training_collector::CollectorError;
use crate::training_export::ExportError;

/// Handler error rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    fn internal(err: impl std::fmt::Display) -> Self {
        error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            StoreError::Invalid(msg) => ApiError::bad_request(msg),
            other => ApiError::internal(other),
        }
    }
}

impl From<FineTuneError> for ApiError {
    fn from(e: FineTuneError) -> Self {
        match e {
            FineTuneError::InsufficientData { .. } | FineTuneError::Validation(_) => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            FineTuneError::InvalidOptions(_) => ApiError::bad_request(e.to_string()),
            FineTuneError::NotFound(_) => ApiError::not_found(e.to_string()),
            FineTuneError::Provider(_) => ApiError::new(StatusCode::BAD_GATEWAY, e.to_string()),
            FineTuneError::Store(inner) => inner.into(),
            FineTuneError::Render(inner) => ApiError::internal(inner),
        }
    }
}

impl From<CollectorError> for ApiError {
    fn from(e: CollectorError) -> Self {
        match e {
            CollectorError::InvalidSnapshot(_) => ApiError::bad_request(e.to_string()),
            CollectorError::Store(inner) => inner.into(),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Store(inner) => inner.into(),
            ExportError::Render(inner) => ApiError::internal(inner),
        }
    }
}

impl From<ScoringError> for ApiError {
    fn from(e: ScoringError) -> Self {
        match e {
            ScoringError::NotFound(_) => ApiError::not_found(e.to_string()),
            ScoringError::Store(inner) => inner.into(),
        }
    }
}
