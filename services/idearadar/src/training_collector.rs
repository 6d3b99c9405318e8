use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{StoreError, TrainingStore};
use crate::types_training::{EngagementMetrics, TrainingDataRecord, TrainingSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Keeps one training record per scored idea up to date.
#[derive(Clone)]
pub struct TrainingCollector {
    store: Arc<dyn TrainingStore>,
}

impl TrainingCollector {
    pub fn new(store: Arc<dyn TrainingStore>) -> Self {
        Self { store }
    }

    pub async fn collect(
        &self,
        idea_id: Uuid,
        snapshot: &TrainingSnapshot,
    ) -> Result<TrainingDataRecord, CollectorError> {
        if snapshot.title.trim().is_empty() {
            return Err(CollectorError::InvalidSnapshot("title is empty".into()));
        }
        if !(0..=100).contains(&snapshot.score) {
            return Err(CollectorError::InvalidSnapshot(format!(
                "score {} outside 0..=100",
                snapshot.score
            )));
        }
        let record = self.store.upsert_training(idea_id, snapshot).await?;
        info!(%idea_id, record_id = %record.id, score = record.score, "training record collected");
        Ok(record)
    }

    /// Patches engagement counts only. `None` when the idea was never collected.
    pub async fn update_engagement(
        &self,
        idea_id: Uuid,
        metrics: EngagementMetrics,
    ) -> Result<Option<TrainingDataRecord>, CollectorError> {
        let record = self.store.update_training_engagement(idea_id, metrics).await?;
        debug!(%idea_id, found = record.is_some(), "training engagement updated");
        Ok(record)
    }

    /// Patches the aggregated discussion text only.
    pub async fn add_comments_context(
        &self,
        idea_id: Uuid,
        text: &str,
    ) -> Result<Option<TrainingDataRecord>, CollectorError> {
        let record = self.store.set_training_comments_context(idea_id, text).await?;
        debug!(%idea_id, found = record.is_some(), "training comments context updated");
        Ok(record)
    }
}
