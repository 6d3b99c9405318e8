use chrono::{DateTime, Utc};
use scoring::{AnalysisContext, EngagementCounts, IdeaText, ScoreBreakdown, SourceInfo};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types_training::EngagementMetrics;

/// The columns of an idea the scoring pipeline reads and writes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IdeaRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub body: Option<String>,
    pub source_forum: Option<String>,
    pub source_community: Option<String>,
    #[serde(flatten)]
    pub engagement: EngagementMetrics,
    pub comments_context: Option<String>,
    pub score: Option<i32>,
    pub score_breakdown: Option<ScoreBreakdown>,
    pub ai_summary: Option<String>,
    pub scored_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl IdeaRecord {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            body: None,
            source_forum: None,
            source_community: None,
            engagement: EngagementMetrics::default(),
            comments_context: None,
            score: None,
            score_breakdown: None,
            ai_summary: None,
            scored_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn idea_text(&self) -> IdeaText {
        IdeaText {
            title: self.title.clone(),
            description: self.description.clone(),
            body: self.body.clone(),
        }
    }

    pub fn analysis_context(&self) -> AnalysisContext {
        let mut ctx = AnalysisContext::with_discussion(self.comments_context.as_deref());
        ctx.source = self.source_forum.as_ref().map(|forum| SourceInfo {
            forum: forum.clone(),
            community: self.source_community.clone(),
        });
        let e = &self.engagement;
        if e.upvotes != 0 || e.downvotes != 0 || e.comments_count != 0 {
            ctx.engagement = Some(EngagementCounts {
                upvotes: e.upvotes,
                downvotes: e.downvotes,
                comments: e.comments_count,
            });
        }
        ctx
    }
}
