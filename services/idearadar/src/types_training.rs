use chrono::{DateTime, Utc};
use scoring::{AnalysisTarget, ExampleSource, IdeaAnalysis, ScoreBreakdown};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSource {
    Manual,
    Engagement,
    Expert,
    Auto,
}

impl ValidationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationSource::Manual => "manual",
            ValidationSource::Engagement => "engagement",
            ValidationSource::Expert => "expert",
            ValidationSource::Auto => "auto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "manual" => ValidationSource::Manual,
            "engagement" => ValidationSource::Engagement,
            "expert" => ValidationSource::Expert,
            "auto" => ValidationSource::Auto,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngagementMetrics {
    pub upvotes: i32,
    pub downvotes: i32,
    pub comments_count: i32,
    pub bookmarks_count: i32,
}

impl EngagementMetrics {
    /// Ranking signal. Postgres computes the same expression as a generated
    /// column; this copy serves the in-memory store.
    pub fn engagement_score(&self) -> f64 {
        f64::from(self.upvotes) - f64::from(self.downvotes)
            + 2.0 * f64::from(self.comments_count)
            + 3.0 * f64::from(self.bookmarks_count)
    }

    /// Names the first negative count, if any.
    pub fn negative_field(&self) -> Option<&'static str> {
        [
            ("upvotes", self.upvotes),
            ("downvotes", self.downvotes),
            ("comments_count", self.comments_count),
            ("bookmarks_count", self.bookmarks_count),
        ]
        .into_iter()
        .find(|(_, v)| *v < 0)
        .map(|(name, _)| name)
    }
}

/// Curated scoring example for one idea.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrainingDataRecord {
    pub id: Uuid,
    pub idea_id: Uuid,

    pub idea_title: String,
    pub idea_description: String,
    pub idea_body: Option<String>,
    pub comments_context: Option<String>,

    pub score: i32,
    pub score_breakdown: Option<ScoreBreakdown>,
    pub ai_summary: Option<String>,
    pub strengths: Option<Vec<String>>,
    pub challenges: Option<Vec<String>>,
    pub target_market: Option<String>,
    pub suggested_next_steps: Option<Vec<String>>,

    #[serde(flatten)]
    pub engagement: EngagementMetrics,
    pub engagement_score: f64,

    pub is_validated: bool,
    pub validation_source: Option<ValidationSource>,
    pub quality_rating: Option<i16>,

    pub included_in_training: bool,
    pub training_job_id: Option<Uuid>,
    pub training_batch: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrainingDataRecord {
    pub fn analysis_target(&self) -> AnalysisTarget {
        AnalysisTarget::from_stored(
            self.score_breakdown.clone(),
            self.ai_summary.clone(),
            self.strengths.clone(),
            self.challenges.clone(),
            self.target_market.clone(),
            self.suggested_next_steps.clone(),
        )
    }

    pub fn example_source(&self) -> ExampleSource<'_> {
        ExampleSource {
            title: &self.idea_title,
            description: &self.idea_description,
            body: self.idea_body.as_deref(),
            comments_context: self.comments_context.as_deref(),
            target: self.analysis_target(),
        }
    }
}

/// What the collector writes on (re-)collection. Validation and training
/// state are deliberately absent.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSnapshot {
    pub title: String,
    pub description: String,
    pub body: Option<String>,
    pub comments_context: Option<String>,
    pub score: i32,
    pub analysis: Option<IdeaAnalysis>,
    pub engagement: EngagementMetrics,
}

impl TrainingSnapshot {
    pub fn from_analysis(
        title: &str,
        description: &str,
        body: Option<&str>,
        comments_context: Option<&str>,
        analysis: &IdeaAnalysis,
        engagement: EngagementMetrics,
    ) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            body: body.map(str::to_string),
            comments_context: comments_context.map(str::to_string),
            score: i32::from(analysis.total_score),
            analysis: Some(analysis.clone()),
            engagement,
        }
    }
}

/// Filters for fine-tuning candidates. `is_validated = true` is always implied.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CandidateFilter {
    #[serde(default)]
    pub exclude_already_trained: bool,
    pub min_engagement_score: Option<f64>,
    pub min_quality_rating: Option<i16>,
    pub limit: Option<i64>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    EngagementScore,
    Score,
}

impl RecordSort {
    pub fn column(&self) -> &'static str {
        match self {
            RecordSort::CreatedAt => "created_at",
            RecordSort::UpdatedAt => "updated_at",
            RecordSort::EngagementScore => "engagement_score",
            RecordSort::Score => "score",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordQuery {
    pub page: u32,
    pub limit: u32,
    pub validated: Option<bool>,
    pub trained: Option<bool>,
    pub sort_by: RecordSort,
    pub sort_order: SortOrder,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            validated: None,
            trained: None,
            sort_by: RecordSort::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl RecordQuery {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RecordPage {
    pub records: Vec<TrainingDataRecord>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

impl RecordPage {
    pub fn new(records: Vec<TrainingDataRecord>, total: i64, query: &RecordQuery) -> Self {
        let limit = i64::from(query.limit.max(1));
        Self {
            records,
            total,
            page: query.page,
            limit: query.limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// Administrative update. Only these fields are ever changed by a human.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordPatch {
    pub is_validated: Option<bool>,
    pub validation_source: Option<ValidationSource>,
    pub quality_rating: Option<i16>,
    pub included_in_training: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct TrainingStats {
    pub total: i64,
    pub validated: i64,
    pub included_in_training: i64,
    pub ready_for_training: i64,
    pub average_score: Option<f64>,
}
