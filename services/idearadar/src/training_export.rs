use std::sync::Arc;

use scoring::render_jsonl;
use tracing::info;

use crate::store::{StoreError, TrainingStore};
use crate::types_training::{CandidateFilter, TrainingDataRecord};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to render example: {0}")]
    Render(#[from] serde_json::Error),
}

/// Picks validated records and renders them as chat-format JSONL.
#[derive(Clone)]
pub struct TrainingExporter {
    store: Arc<dyn TrainingStore>,
}

impl TrainingExporter {
    pub fn new(store: Arc<dyn TrainingStore>) -> Self {
        Self { store }
    }

    /// Validated records only, most engaged first.
    pub async fn select_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<TrainingDataRecord>, StoreError> {
        self.store.select_candidates(filter).await
    }

    pub async fn export_jsonl(&self, filter: &CandidateFilter) -> Result<String, ExportError> {
        let candidates = self.select_candidates(filter).await?;
        let lines = render_lines(&candidates)?;
        info!(examples = lines.len(), "training corpus exported");
        Ok(lines.join("\n"))
    }
}

/// One JSONL line per record, in the given order.
pub fn render_lines(records: &[TrainingDataRecord]) -> Result<Vec<String>, serde_json::Error> {
    render_jsonl(records.iter().map(TrainingDataRecord::example_source))
}
