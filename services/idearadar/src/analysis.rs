use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scoring::{
    analysis_json_schema, build_quick_score_prompt, build_user_prompt, parse_analysis,
    parse_quick_score, strip_code_fences, AnalysisContext, IdeaAnalysis, IdeaText, ParseError,
    QuickScore, StructuredAnalysis, ANALYSIS_SYSTEM_PROMPT, QUICK_SCORE_SYSTEM_PROMPT,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AppConfig, ScoringProvider, ScoringStrategy};
use crate::provider::{CompletionRequest, LlmProvider, ProviderError, ResponseFormat};

const SCHEMA_NAME: &str = "idea_analysis";

/// Idea scoring. Never fails: every error path degrades to the fixed default.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(&self, idea: &IdeaText, ctx: &AnalysisContext) -> IdeaAnalysis;
    async fn quick_score(&self, title: &str, description: &str) -> QuickScore;
}

/// Supplies a fine-tuned model to use instead of the base model, if any.
#[async_trait]
pub trait ModelResolver: Send + Sync {
    async fn fine_tuned_model(&self) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
enum AnalysisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

pub struct LlmAnalysisClient {
    provider: Arc<dyn LlmProvider>,
    strategy: ScoringStrategy,
    base_model: String,
    temperature: f32,
    timeout: Duration,
    schema: Value,
    resolver: Option<Arc<dyn ModelResolver>>,
}

impl LlmAnalysisClient {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        strategy: ScoringStrategy,
        base_model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            strategy,
            base_model,
            temperature,
            timeout,
            schema: analysis_json_schema(),
            resolver: None,
        }
    }

    /// Client as configured: Gemini always runs in JSON mode, and the
    /// fine-tuned model is only preferred when scoring on OpenAI.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn LlmProvider>,
        resolver: Arc<dyn ModelResolver>,
    ) -> Self {
        let strategy = match config.scoring_provider {
            ScoringProvider::Gemini => ScoringStrategy::JsonMode,
            ScoringProvider::OpenAi => config.scoring_strategy,
        };
        let client = Self::new(
            provider,
            strategy,
            config.scoring_model.clone(),
            config.scoring_temperature,
            Duration::from_secs(config.llm_timeout_secs),
        );
        if config.prefer_fine_tuned && config.scoring_provider == ScoringProvider::OpenAi {
            client.with_resolver(resolver)
        } else {
            client
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ModelResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    async fn model(&self) -> String {
        if let Some(resolver) = &self.resolver {
            if let Some(model) = resolver.fine_tuned_model().await {
                return model;
            }
        }
        self.base_model.clone()
    }

    async fn complete(&self, req: CompletionRequest) -> Result<String, AnalysisError> {
        match tokio::time::timeout(self.timeout, self.provider.complete(req)).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(AnalysisError::Timeout(self.timeout)),
        }
    }

    async fn try_analyze(
        &self,
        model: String,
        idea: &IdeaText,
        ctx: &AnalysisContext,
    ) -> Result<IdeaAnalysis, AnalysisError> {
        let response_format = match self.strategy {
            ScoringStrategy::StrictSchema => ResponseFormat::JsonSchema {
                name: SCHEMA_NAME.to_string(),
                schema: self.schema.clone(),
            },
            ScoringStrategy::JsonMode => ResponseFormat::JsonObject,
        };
        let raw = self
            .complete(CompletionRequest {
                model,
                system: ANALYSIS_SYSTEM_PROMPT.to_string(),
                user: build_user_prompt(idea, ctx),
                temperature: self.temperature,
                response_format,
            })
            .await?;

        if self.strategy == ScoringStrategy::StrictSchema {
            match serde_json::from_str::<StructuredAnalysis>(strip_code_fences(&raw)) {
                Ok(structured) => return Ok(structured.into_analysis()),
                // providers without strict mode still answer in JSON
                Err(e) => debug!(error = %e, "structured output did not match schema; repairing"),
            }
        }
        Ok(parse_analysis(&raw, &idea.description)?)
    }

    async fn try_quick_score(&self, title: &str, description: &str) -> Result<QuickScore, AnalysisError> {
        let raw = self
            .complete(CompletionRequest {
                // quick scores never use the fine-tuned analysis model
                model: self.base_model.clone(),
                system: QUICK_SCORE_SYSTEM_PROMPT.to_string(),
                user: build_quick_score_prompt(title, description),
                temperature: self.temperature,
                response_format: ResponseFormat::JsonObject,
            })
            .await?;
        Ok(parse_quick_score(&raw, description)?)
    }
}

#[async_trait]
impl AnalysisClient for LlmAnalysisClient {
    async fn analyze(&self, idea: &IdeaText, ctx: &AnalysisContext) -> IdeaAnalysis {
        let model = self.model().await;
        match self.try_analyze(model.clone(), idea, ctx).await {
            Ok(analysis) => {
                debug!(%model, total = analysis.total_score, "idea analyzed");
                analysis
            }
            Err(e) => {
                warn!(%model, error = %e, "analysis failed; using default analysis");
                IdeaAnalysis::fallback(&idea.description)
            }
        }
    }

    async fn quick_score(&self, title: &str, description: &str) -> QuickScore {
        match self.try_quick_score(title, description).await {
            Ok(score) => score,
            Err(e) => {
                warn!(error = %e, "quick score failed; using default score");
                QuickScore::fallback(description)
            }
        }
    }
}
