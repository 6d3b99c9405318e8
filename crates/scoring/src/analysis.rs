use serde::{Deserialize, Serialize};

use crate::breakdown::{ScoreBreakdown, DEFAULT_CRITERION_SCORE};

/// Strengths, challenges and next steps are each capped at this many entries.
pub const MAX_LIST_ITEMS: usize = 3;

pub(crate) const DEFAULT_TARGET_MARKET: &str = "General market";

/// Result of one full scoring call. Never persisted as-is; callers pick the
/// fields they keep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaAnalysis {
    pub score_breakdown: ScoreBreakdown,
    pub total_score: u8,
    pub ai_summary: String,
    pub strengths: Vec<String>,
    pub challenges: Vec<String>,
    pub target_market: String,
    pub suggested_next_steps: Vec<String>,
}

impl IdeaAnalysis {
    /// Assembles an analysis, normalizing the breakdown and capping every list.
    /// `total_score` is always derived, never taken from the caller.
    pub fn new(
        score_breakdown: ScoreBreakdown,
        ai_summary: String,
        strengths: Vec<String>,
        challenges: Vec<String>,
        target_market: String,
        suggested_next_steps: Vec<String>,
    ) -> Self {
        let score_breakdown = score_breakdown.normalized();
        Self {
            total_score: score_breakdown.total(),
            score_breakdown,
            ai_summary,
            strengths: cap(strengths),
            challenges: cap(challenges),
            target_market,
            suggested_next_steps: cap(suggested_next_steps),
        }
    }

    /// Returned whenever the model call or its output is unusable.
    pub fn fallback(description: &str) -> Self {
        Self::new(
            ScoreBreakdown::uniform(DEFAULT_CRITERION_SCORE),
            description.to_string(),
            vec!["Addresses a recognizable problem".to_string()],
            vec!["Market demand has not been validated yet".to_string()],
            DEFAULT_TARGET_MARKET.to_string(),
            vec![
                "Interview potential customers to confirm the problem".to_string(),
                "Build a minimal prototype to test demand".to_string(),
            ],
        )
    }

    /// True when this is the default analysis for `description` rather than
    /// a model answer.
    pub fn is_fallback_for(&self, description: &str) -> bool {
        *self == Self::fallback(description)
    }
}

/// Lightweight single-number score used for bulk re-scoring.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickScore {
    pub score: u8,
    pub summary: String,
}

impl QuickScore {
    pub fn fallback(description: &str) -> Self {
        Self {
            score: 50,
            summary: description.to_string(),
        }
    }
}

pub(crate) fn cap(mut items: Vec<String>) -> Vec<String> {
    items.retain(|s| !s.trim().is_empty());
    items.truncate(MAX_LIST_ITEMS);
    items
}
