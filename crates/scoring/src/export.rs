use serde::{Deserialize, Serialize};

use crate::analysis::DEFAULT_TARGET_MARKET;
use crate::breakdown::ScoreBreakdown;
use crate::prompt::{build_user_prompt, AnalysisContext, IdeaText, TRAINING_SYSTEM_PROMPT};

/// Keys every assistant turn carries, in serialization order.
pub const ANALYSIS_KEYS: [&str; 6] = [
    "score_breakdown",
    "ai_summary",
    "strengths",
    "challenges",
    "target_market",
    "suggested_next_steps",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// One line of a fine-tuning file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub messages: Vec<ChatMessage>,
}

/// Gold answer for the assistant turn. Every key is always present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisTarget {
    pub score_breakdown: ScoreBreakdown,
    pub ai_summary: String,
    pub strengths: Vec<String>,
    pub challenges: Vec<String>,
    pub target_market: String,
    pub suggested_next_steps: Vec<String>,
}

impl AnalysisTarget {
    /// Fills absent stored fields with empty values so every example has the
    /// same shape.
    pub fn from_stored(
        score_breakdown: Option<ScoreBreakdown>,
        ai_summary: Option<String>,
        strengths: Option<Vec<String>>,
        challenges: Option<Vec<String>>,
        target_market: Option<String>,
        suggested_next_steps: Option<Vec<String>>,
    ) -> Self {
        Self {
            score_breakdown: score_breakdown.unwrap_or_default(),
            ai_summary: ai_summary.unwrap_or_default(),
            strengths: strengths.unwrap_or_default(),
            challenges: challenges.unwrap_or_default(),
            target_market: target_market.unwrap_or_else(|| DEFAULT_TARGET_MARKET.to_string()),
            suggested_next_steps: suggested_next_steps.unwrap_or_default(),
        }
    }
}

/// Borrowed view of one stored record, enough to render an example.
#[derive(Clone, Debug)]
pub struct ExampleSource<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub body: Option<&'a str>,
    pub comments_context: Option<&'a str>,
    pub target: AnalysisTarget,
}

pub fn render_example(src: &ExampleSource<'_>) -> Result<String, serde_json::Error> {
    let idea = IdeaText {
        title: src.title.to_string(),
        description: src.description.to_string(),
        body: src.body.map(str::to_string),
    };
    let user = build_user_prompt(&idea, &AnalysisContext::with_discussion(src.comments_context));
    let assistant = serde_json::to_string(&src.target)?;

    let example = TrainingExample {
        messages: vec![
            ChatMessage::new("system", TRAINING_SYSTEM_PROMPT),
            ChatMessage::new("user", user),
            ChatMessage::new("assistant", assistant),
        ],
    };
    serde_json::to_string(&example)
}

/// Renders one line per source. Join with `\n` for a JSONL file.
pub fn render_jsonl<'a, I>(sources: I) -> Result<Vec<String>, serde_json::Error>
where
    I: IntoIterator<Item = ExampleSource<'a>>,
{
    sources.into_iter().map(|s| render_example(&s)).collect()
}

/// Positional split: the first `floor(n * (1 - fraction))` lines train, the
/// rest validate. A fraction outside (0, 1) keeps everything for training.
pub fn split_for_validation<T: Clone>(lines: &[T], fraction: f64) -> (Vec<T>, Vec<T>) {
    if !(fraction > 0.0 && fraction < 1.0) {
        return (lines.to_vec(), Vec::new());
    }
    // epsilon absorbs float error such as 10 * 0.7 = 6.999..
    let cut = ((lines.len() as f64) * (1.0 - fraction) + 1e-9).floor() as usize;
    let cut = cut.min(lines.len());
    (lines[..cut].to_vec(), lines[cut..].to_vec())
}
