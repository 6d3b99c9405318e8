use std::sync::Arc;

use crate::analysis::AnalysisClient;
use crate::config::AppConfig;
use crate::finetune_job::FineTuneOrchestrator;
use crate::provider::LlmProvider;
use crate::scoring_service::ScoringService;
use crate::store::{IdeaStore, Store, TrainingStore};
use crate::training_collector::TrainingCollector;
use crate::training_export::TrainingExporter;

pub type SharedState = Arc<AppState>;

/// Everything the handlers need, built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub ideas: Arc<dyn IdeaStore>,
    pub training: Arc<dyn TrainingStore>,
    pub llm: Arc<dyn LlmProvider>,
    pub collector: TrainingCollector,
    pub exporter: TrainingExporter,
    pub finetune: FineTuneOrchestrator,
    pub scoring: ScoringService,
}

impl AppState {
    pub fn new<S>(
        config: AppConfig,
        store: Arc<S>,
        llm: Arc<dyn LlmProvider>,
        finetune: FineTuneOrchestrator,
        analysis: Arc<dyn AnalysisClient>,
    ) -> Self
    where
        S: Store + 'static,
    {
        let collector = TrainingCollector::new(store.clone());
        let scoring = ScoringService::new(store.clone(), analysis, collector.clone());
        Self {
            config,
            ideas: store.clone(),
            training: store.clone(),
            exporter: TrainingExporter::new(store.clone()),
            store,
            llm,
            collector,
            finetune,
            scoring,
        }
    }
}
