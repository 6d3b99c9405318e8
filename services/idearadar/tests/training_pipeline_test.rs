mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{analysis_json, seed_validated, validated_record, ScriptedLlm};
use idearadar::analysis::LlmAnalysisClient;
use idearadar::config::ScoringStrategy;
use idearadar::provider::ProviderError;
use idearadar::scoring_service::{RescoreSummary, ScoringService};
use idearadar::store::{IdeaStore, TrainingStore};
use idearadar::store_memory::MemoryStore;
use idearadar::training_collector::TrainingCollector;
use idearadar::training_export::TrainingExporter;
use idearadar::types_ideas::IdeaRecord;
use idearadar::types_training::{CandidateFilter, EngagementMetrics, RecordPatch, ValidationSource};
use scoring::ANALYSIS_KEYS;
use serde_json::Value;

fn scoring_service(store: Arc<MemoryStore>, llm: Arc<ScriptedLlm>) -> ScoringService {
    let analysis = LlmAnalysisClient::new(
        llm,
        ScoringStrategy::StrictSchema,
        "gpt-4o-mini".into(),
        0.2,
        Duration::from_secs(5),
    );
    ScoringService::new(
        store.clone(),
        Arc::new(analysis),
        TrainingCollector::new(store),
    )
}

#[tokio::test]
async fn exported_lines_are_complete_conversations() {
    let store = Arc::new(MemoryStore::new());
    let mut with_comments = validated_record("Commented idea", 30);
    with_comments.comments_context = Some("People asked about pricing".into());
    store.insert_training(with_comments).await;
    let mut sparse = validated_record("Sparse idea", 5);
    sparse.strengths = None;
    sparse.target_market = None;
    store.insert_training(sparse).await;

    let exporter = TrainingExporter::new(store.clone());
    let jsonl = exporter.export_jsonl(&CandidateFilter::default()).await.unwrap();

    assert!(!jsonl.contains("\n\n"));
    assert!(!jsonl.ends_with('\n'));
    let lines: Vec<&str> = jsonl.lines().collect();
    assert_eq!(lines.len(), 2);

    for line in &lines {
        let v: Value = serde_json::from_str(line).unwrap();
        let messages = v["messages"].as_array().unwrap();
        let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, ["system", "user", "assistant"]);

        let target: Value = serde_json::from_str(messages[2]["content"].as_str().unwrap()).unwrap();
        for key in ANALYSIS_KEYS {
            assert!(target.get(key).is_some(), "missing {key}");
        }
    }

    // highest engagement first
    let first: Value = serde_json::from_str(lines[0]).unwrap();
    let user = first["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("Title: Commented idea"));
    assert!(user.contains("Community discussion:\nPeople asked about pricing"));

    let second: Value = serde_json::from_str(lines[1]).unwrap();
    let target: Value =
        serde_json::from_str(second["messages"][2]["content"].as_str().unwrap()).unwrap();
    assert_eq!(target["strengths"], Value::Array(vec![]));
    assert_eq!(target["target_market"], "General market");
}

#[tokio::test]
async fn empty_corpus_exports_empty_text() {
    let store = Arc::new(MemoryStore::new());
    let exporter = TrainingExporter::new(store);
    assert_eq!(exporter.export_jsonl(&CandidateFilter::default()).await.unwrap(), "");
}

#[tokio::test]
async fn candidates_are_validated_and_optionally_untrained() {
    let store = Arc::new(MemoryStore::new());
    seed_validated(&store, 3).await;

    let mut unvalidated = validated_record("Unreviewed", 100);
    unvalidated.is_validated = false;
    store.insert_training(unvalidated).await;

    let mut trained = validated_record("Already used", 90);
    trained.included_in_training = true;
    trained.training_batch = Some("batch-2026-01-01".into());
    store.insert_training(trained).await;

    let exporter = TrainingExporter::new(store.clone());

    let all = exporter.select_candidates(&CandidateFilter::default()).await.unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|r| r.is_validated));
    assert_eq!(all[0].idea_title, "Already used");

    let fresh = exporter
        .select_candidates(&CandidateFilter {
            exclude_already_trained: true,
            ..CandidateFilter::default()
        })
        .await
        .unwrap();
    let titles: Vec<&str> = fresh.iter().map(|r| r.idea_title.as_str()).collect();
    assert_eq!(titles, ["Idea 3", "Idea 2", "Idea 1"]);

    let limited = exporter
        .select_candidates(&CandidateFilter {
            min_engagement_score: Some(2.0),
            limit: Some(1),
            exclude_already_trained: true,
            ..CandidateFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].idea_title, "Idea 3");
}

#[tokio::test]
async fn scoring_an_idea_stores_the_score_and_a_training_record() {
    let store = Arc::new(MemoryStore::new());
    let mut idea = IdeaRecord::new("Meal prep for shift workers", "Weekly meals delivered before night shifts");
    idea.source_forum = Some("reddit".into());
    idea.engagement = EngagementMetrics {
        upvotes: 12,
        downvotes: 2,
        comments_count: 4,
        bookmarks_count: 1,
    };
    let idea_id = idea.id;
    store.insert_idea(idea).await;

    let llm = Arc::new(ScriptedLlm::new());
    llm.push_ok(analysis_json(7));
    let service = scoring_service(store.clone(), llm.clone());

    let analysis = service.score_idea(idea_id).await.unwrap();
    assert_eq!(analysis.total_score, 70);

    let stored = store.get_idea(idea_id).await.unwrap().unwrap();
    assert_eq!(stored.score, Some(70));
    assert!(stored.score_breakdown.is_some());
    assert!(stored.scored_at.is_some());

    let record = store.get_training_by_idea(idea_id).await.unwrap().unwrap();
    assert_eq!(record.score, 70);
    assert_eq!(record.target_market.as_deref(), Some("Independent landlords"));
    assert_eq!(record.strengths.as_ref().map(Vec::len), Some(3));
    assert!(!record.is_validated);
    assert_eq!(record.engagement_score, 12.0 - 2.0 + 8.0 + 3.0);

    let user = llm.requests.lock().unwrap()[0].user.clone();
    assert!(user.contains("posted on reddit"));
}

#[tokio::test]
async fn rescoring_keeps_review_state() {
    let store = Arc::new(MemoryStore::new());
    let idea = IdeaRecord::new("Bike repair van", "Mobile repairs at offices");
    let idea_id = idea.id;
    store.insert_idea(idea).await;

    let llm = Arc::new(ScriptedLlm::new());
    llm.push_ok(analysis_json(5));
    llm.push_ok(analysis_json(8));
    let service = scoring_service(store.clone(), llm);

    service.score_idea(idea_id).await.unwrap();
    let first = store.get_training_by_idea(idea_id).await.unwrap().unwrap();
    store
        .patch_training(
            first.id,
            &RecordPatch {
                is_validated: Some(true),
                validation_source: Some(ValidationSource::Manual),
                quality_rating: Some(5),
                included_in_training: None,
            },
        )
        .await
        .unwrap();

    service.score_idea(idea_id).await.unwrap();
    let second = store.get_training_by_idea(idea_id).await.unwrap().unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.score, 80);
    assert!(second.is_validated);
    assert_eq!(second.quality_rating, Some(5));
}

#[tokio::test]
async fn failed_analysis_still_scores_with_default() {
    let store = Arc::new(MemoryStore::new());
    let idea = IdeaRecord::new("Pet sitter matching", "Neighbors watch each other's pets");
    let idea_id = idea.id;
    store.insert_idea(idea).await;

    let llm = Arc::new(ScriptedLlm::new());
    llm.push_err(ProviderError::Timeout);
    let service = scoring_service(store.clone(), llm);

    let analysis = service.score_idea(idea_id).await.unwrap();
    assert_eq!(analysis.total_score, 50);
    assert_eq!(analysis.ai_summary, "Neighbors watch each other's pets");
    assert_eq!(store.get_idea(idea_id).await.unwrap().unwrap().score, Some(50));
    assert!(store.get_training_by_idea(idea_id).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_rescore_keeps_the_earlier_training_record() {
    let store = Arc::new(MemoryStore::new());
    let idea = IdeaRecord::new("Bike repair van", "Mobile bike repairs at offices");
    let idea_id = idea.id;
    store.insert_idea(idea).await;

    let llm = Arc::new(ScriptedLlm::new());
    llm.push_ok(analysis_json(8));
    llm.push_err(ProviderError::Timeout);
    let service = scoring_service(store.clone(), llm);

    service.score_idea(idea_id).await.unwrap();
    let analysis = service.score_idea(idea_id).await.unwrap();
    assert_eq!(analysis.total_score, 50);

    let record = store.get_training_by_idea(idea_id).await.unwrap().unwrap();
    assert_eq!(record.score, 80);
    assert_ne!(record.ai_summary.as_deref(), Some("Mobile bike repairs at offices"));
}

#[tokio::test]
async fn scoring_unknown_idea_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let service = scoring_service(store, Arc::new(ScriptedLlm::new()));
    let err = service.score_idea(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn bulk_rescore_writes_quick_scores_for_unscored_ideas() {
    let store = Arc::new(MemoryStore::new());
    let mut scored = IdeaRecord::new("Scored already", "Has a score");
    scored.score = Some(64);
    let scored_id = scored.id;
    store.insert_idea(scored).await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let idea = IdeaRecord::new(&format!("Unscored {i}"), "Needs a score");
        ids.push(idea.id);
        store.insert_idea(idea).await;
    }

    let llm = Arc::new(ScriptedLlm::new());
    for _ in 0..3 {
        llm.push_ok(r#"{"score": 61, "summary": "Decent niche"}"#);
    }
    let service = scoring_service(store.clone(), llm.clone());

    let summary = service.bulk_rescore(10, false).await.unwrap();
    assert_eq!(
        summary,
        RescoreSummary {
            selected: 3,
            scored: 3,
            failed: 0
        }
    );

    for id in ids {
        let idea = store.get_idea(id).await.unwrap().unwrap();
        assert_eq!(idea.score, Some(61));
        assert_eq!(idea.ai_summary.as_deref(), Some("Decent niche"));
        assert!(idea.score_breakdown.is_none());
        assert!(store.get_training_by_idea(id).await.unwrap().is_none());
    }
    assert_eq!(store.get_idea(scored_id).await.unwrap().unwrap().score, Some(64));
    assert!(llm.models_used().iter().all(|m| m == "gpt-4o-mini"));
}

#[tokio::test]
async fn bulk_rescore_respects_limit() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..5 {
        store.insert_idea(IdeaRecord::new(&format!("Idea {i}"), "d")).await;
    }
    let llm = Arc::new(ScriptedLlm::new());
    let service = scoring_service(store.clone(), llm.clone());

    // unscripted calls fail and fall back to 50, which still counts as scored
    let summary = service.bulk_rescore(2, false).await.unwrap();
    assert_eq!(summary.selected, 2);
    assert_eq!(summary.scored, 2);
    assert_eq!(store.rescore_candidates(10, false).await.unwrap().len(), 3);
    assert_eq!(llm.requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn bulk_rescore_can_refresh_scored_ideas_stalest_first() {
    let store = Arc::new(MemoryStore::new());
    let now = chrono::Utc::now();
    let mut recent = IdeaRecord::new("Recently scored", "Fresh score");
    recent.score = Some(72);
    recent.scored_at = Some(now);
    let mut stale = IdeaRecord::new("Scored long ago", "Old score");
    stale.score = Some(30);
    stale.score_breakdown = Some(scoring::ScoreBreakdown::uniform(3));
    stale.scored_at = Some(now - chrono::Duration::days(30));
    let unscored = IdeaRecord::new("Never scored", "No score");
    let (recent_id, stale_id, unscored_id) = (recent.id, stale.id, unscored.id);
    for idea in [recent, stale, unscored] {
        store.insert_idea(idea).await;
    }

    let order: Vec<_> = store
        .rescore_candidates(10, true)
        .await
        .unwrap()
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(order, vec![unscored_id, stale_id, recent_id]);

    let llm = Arc::new(ScriptedLlm::new());
    llm.push_ok(r#"{"score": 55, "summary": "Refreshed"}"#);
    llm.push_ok(r#"{"score": 44, "summary": "Refreshed"}"#);
    let service = scoring_service(store.clone(), llm);

    let summary = service.bulk_rescore(2, true).await.unwrap();
    assert_eq!(summary.selected, 2);

    let stale = store.get_idea(stale_id).await.unwrap().unwrap();
    assert!(matches!(stale.score, Some(55) | Some(44)));
    assert_eq!(stale.ai_summary.as_deref(), Some("Refreshed"));
    assert_eq!(stale.score_breakdown, Some(scoring::ScoreBreakdown::uniform(3)));
    assert_eq!(store.get_idea(recent_id).await.unwrap().unwrap().score, Some(72));
    assert!(store.get_idea(unscored_id).await.unwrap().unwrap().score.is_some());
}
