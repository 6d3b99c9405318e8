mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{analysis_json, test_config, ScriptedLlm};
use idearadar::analysis::{AnalysisClient, LlmAnalysisClient, ModelResolver};
use idearadar::config::ScoringStrategy;
use idearadar::provider::{ProviderError, ResponseFormat};
use scoring::{AnalysisContext, IdeaText, SourceInfo};

struct FixedModel(Option<&'static str>);

#[async_trait]
impl ModelResolver for FixedModel {
    async fn fine_tuned_model(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

fn idea() -> IdeaText {
    IdeaText {
        title: "Laundry pickup for dorms".into(),
        description: "Students schedule pickup and get clean clothes back in 24 hours".into(),
        body: None,
    }
}

fn client(llm: Arc<ScriptedLlm>, strategy: ScoringStrategy) -> LlmAnalysisClient {
    LlmAnalysisClient::new(llm, strategy, "gpt-4o-mini".into(), 0.2, Duration::from_secs(5))
}

#[tokio::test]
async fn provider_error_returns_default_analysis() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_err(ProviderError::Network("connection reset".into()));

    let analysis = client(llm, ScoringStrategy::StrictSchema)
        .analyze(&idea(), &AnalysisContext::default())
        .await;

    assert_eq!(analysis.total_score, 50);
    assert_eq!(analysis.ai_summary, idea().description);
    assert_eq!(analysis.strengths.len(), 1);
    assert_eq!(analysis.challenges.len(), 1);
}

#[tokio::test]
async fn refusal_and_garbage_return_default_analysis() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_err(ProviderError::Refusal("cannot help".into()));
    llm.push_ok("I think this idea is great!");
    let c = client(llm, ScoringStrategy::JsonMode);

    for _ in 0..2 {
        let analysis = c.analyze(&idea(), &AnalysisContext::default()).await;
        assert_eq!(analysis.total_score, 50);
        assert_eq!(analysis.ai_summary, idea().description);
    }
}

#[tokio::test]
async fn timeout_reaches_the_fallback() {
    let llm = Arc::new(ScriptedLlm::slow(Duration::from_millis(500)));
    llm.push_ok(analysis_json(9));
    let c = LlmAnalysisClient::new(
        llm,
        ScoringStrategy::StrictSchema,
        "gpt-4o-mini".into(),
        0.2,
        Duration::from_millis(50),
    );

    let analysis = c.analyze(&idea(), &AnalysisContext::default()).await;
    assert_eq!(analysis.total_score, 50);
    assert_eq!(analysis.ai_summary, idea().description);
}

#[tokio::test]
async fn strict_schema_answer_is_used_as_is() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_ok(analysis_json(8));
    let analysis = client(llm.clone(), ScoringStrategy::StrictSchema)
        .analyze(&idea(), &AnalysisContext::default())
        .await;

    assert_eq!(analysis.total_score, 80);
    assert_eq!(analysis.target_market, "Independent landlords");
    assert_eq!(analysis.strengths.len(), 3);

    let requests = llm.requests.lock().unwrap();
    assert!(matches!(
        &requests[0].response_format,
        ResponseFormat::JsonSchema { name, .. } if name == "idea_analysis"
    ));
    assert!(requests[0].temperature <= 0.3);
}

#[tokio::test]
async fn json_mode_answer_is_repaired() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_ok(
        "```json\n{\"scoreBreakdown\": {\"market_demand\": -3, \"market_timing\": 10, \
         \"revenue_clarity\": 10, \"scalability\": 10, \"unique_value\": 10, \
         \"competitive_moat\": 10, \"technical_feasibility\": 10, \
         \"execution_complexity\": 10, \"market_risk\": 10, \"regulatory_risk\": 10}, \
         \"aiSummary\": \"Solid.\"}\n```",
    );
    let analysis = client(llm.clone(), ScoringStrategy::JsonMode)
        .analyze(&idea(), &AnalysisContext::default())
        .await;

    assert_eq!(analysis.score_breakdown.market_demand, 5);
    assert_eq!(analysis.total_score, 95);
    assert_eq!(analysis.ai_summary, "Solid.");
    assert_eq!(analysis.target_market, "General market");
    assert_eq!(
        llm.requests.lock().unwrap()[0].response_format,
        ResponseFormat::JsonObject
    );
}

#[tokio::test]
async fn context_is_folded_into_the_user_turn() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_ok(analysis_json(6));
    let ctx = AnalysisContext {
        source: Some(SourceInfo {
            forum: "reddit".into(),
            community: Some("startups".into()),
        }),
        engagement: None,
        community_discussion: Some("Would use this every week".into()),
    };
    client(llm.clone(), ScoringStrategy::StrictSchema)
        .analyze(&idea(), &ctx)
        .await;

    let requests = llm.requests.lock().unwrap();
    assert!(requests[0].user.contains("community \"startups\""));
    assert!(requests[0].user.contains("Would use this every week"));
    assert!(requests[0].system.contains("100 points"));
}

#[tokio::test]
async fn fine_tuned_model_is_preferred_for_analysis_only() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_ok(analysis_json(6));
    llm.push_ok(r#"{"score": 73, "summary": "Good"}"#);
    let c = client(llm.clone(), ScoringStrategy::StrictSchema)
        .with_resolver(Arc::new(FixedModel(Some("ft:gpt-4o-mini:idearadar:xyz"))));

    c.analyze(&idea(), &AnalysisContext::default()).await;
    let quick = c.quick_score("t", "d").await;

    assert_eq!(quick.score, 73);
    assert_eq!(
        llm.models_used(),
        vec!["ft:gpt-4o-mini:idearadar:xyz".to_string(), "gpt-4o-mini".to_string()]
    );
}

#[tokio::test]
async fn base_model_is_used_without_fine_tuned_model() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_ok(analysis_json(6));
    let c = client(llm.clone(), ScoringStrategy::StrictSchema).with_resolver(Arc::new(FixedModel(None)));
    c.analyze(&idea(), &AnalysisContext::default()).await;
    assert_eq!(llm.models_used(), vec!["gpt-4o-mini".to_string()]);
}

#[tokio::test]
async fn quick_score_falls_back_and_clamps() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_err(ProviderError::Timeout);
    llm.push_ok(r#"{"score": 180}"#);
    let c = client(llm, ScoringStrategy::JsonMode);

    let failed = c.quick_score("t", "the description").await;
    assert_eq!(failed.score, 50);
    assert_eq!(failed.summary, "the description");

    let clamped = c.quick_score("t", "the description").await;
    assert_eq!(clamped.score, 100);
    assert_eq!(clamped.summary, "the description");
}

#[tokio::test]
async fn gemini_config_forces_json_mode_and_skips_fine_tuned_model() {
    let cfg = test_config(&[("SCORING_PROVIDER", "gemini"), ("GEMINI_API_KEY", "g"), ("SCORING_MODEL", "gemini-1.5-flash")]);
    let llm = Arc::new(ScriptedLlm::new());
    llm.push_ok(analysis_json(5));
    let c = LlmAnalysisClient::from_config(&cfg, llm.clone(), Arc::new(FixedModel(Some("ft:x"))));

    c.analyze(&idea(), &AnalysisContext::default()).await;

    let requests = llm.requests.lock().unwrap();
    assert_eq!(requests[0].model, "gemini-1.5-flash");
    assert_eq!(requests[0].response_format, ResponseFormat::JsonObject);
}
