use std::sync::Arc;

use futures::stream::{self, StreamExt};
use scoring::IdeaAnalysis;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::AnalysisClient;
use crate::store::{IdeaStore, StoreError};
use crate::training_collector::TrainingCollector;
use crate::types_training::TrainingSnapshot;

/// Quick scores in flight at once during a bulk pass.
const RESCORE_CONCURRENCY: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("idea {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RescoreSummary {
    pub selected: usize,
    pub scored: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ScoringService {
    ideas: Arc<dyn IdeaStore>,
    analysis: Arc<dyn AnalysisClient>,
    collector: TrainingCollector,
}

impl ScoringService {
    pub fn new(
        ideas: Arc<dyn IdeaStore>,
        analysis: Arc<dyn AnalysisClient>,
        collector: TrainingCollector,
    ) -> Self {
        Self {
            ideas,
            analysis,
            collector,
        }
    }

    /// Full analysis of one idea. The result is stored on the idea and
    /// snapshotted as a training record unless it is the default analysis;
    /// a collection failure is logged only.
    pub async fn score_idea(&self, idea_id: Uuid) -> Result<IdeaAnalysis, ScoringError> {
        let idea = self
            .ideas
            .get_idea(idea_id)
            .await?
            .ok_or(ScoringError::NotFound(idea_id))?;

        let analysis = self
            .analysis
            .analyze(&idea.idea_text(), &idea.analysis_context())
            .await;
        self.ideas.save_analysis(idea_id, &analysis).await?;

        if analysis.is_fallback_for(&idea.description) {
            warn!(%idea_id, "default analysis kept out of training data");
            return Ok(analysis);
        }

        let snapshot = TrainingSnapshot::from_analysis(
            &idea.title,
            &idea.description,
            idea.body.as_deref(),
            idea.comments_context.as_deref(),
            &analysis,
            idea.engagement,
        );
        if let Err(e) = self.collector.collect(idea_id, &snapshot).await {
            warn!(%idea_id, error = %e, "training data collection failed");
        }

        info!(%idea_id, score = analysis.total_score, "idea scored");
        Ok(analysis)
    }

    /// Quick-scores ideas that have no score yet and, with `include_scored`,
    /// refreshes the stalest existing scores. Writes score and summary only.
    pub async fn bulk_rescore(&self, limit: i64, include_scored: bool) -> Result<RescoreSummary, ScoringError> {
        let ideas = self.ideas.rescore_candidates(limit, include_scored).await?;
        let selected = ideas.len();

        let outcomes: Vec<bool> = stream::iter(ideas)
            .map(|idea| async move {
                let score = self.analysis.quick_score(&idea.title, &idea.description).await;
                match self.ideas.save_quick_score(idea.id, &score).await {
                    Ok(saved) => saved,
                    Err(e) => {
                        warn!(idea_id = %idea.id, error = %e, "failed to save quick score");
                        false
                    }
                }
            })
            .buffer_unordered(RESCORE_CONCURRENCY)
            .collect()
            .await;

        let scored = outcomes.iter().filter(|ok| **ok).count();
        let summary = RescoreSummary {
            selected,
            scored,
            failed: selected - scored,
        };
        info!(selected, scored, include_scored, "bulk rescore finished");
        Ok(summary)
    }
}
