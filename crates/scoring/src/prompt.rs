use serde::{Deserialize, Serialize};

// Macros rather than consts so the pieces can be joined with `concat!`.
macro_rules! rubric {
    () => {
        "Score the idea on ten criteria. Each criterion is an integer from 0 to 10.
The criteria form five groups worth 20 points each (100 points total):

1. Market & Timing (20)
   - market_demand: how many people actively have this problem and would pay to solve it
   - market_timing: whether now is the right moment (trends, enabling technology, regulation)
2. Business Viability (20)
   - revenue_clarity: how obvious and credible the path to revenue is
   - scalability: whether revenue can grow much faster than cost
3. Competitive Position (20)
   - unique_value: how clearly differentiated the offer is from existing alternatives
   - competitive_moat: how hard it would be for others to copy
4. Execution (20)
   - technical_feasibility: whether it can be built with today's technology by a small team
   - execution_complexity: higher means SIMPLER to execute (fewer dependencies, partners, capital)
5. Risk (20)
   - market_risk: higher means LOWER risk that the market does not materialize
   - regulatory_risk: higher means LOWER legal, compliance or platform risk

Be calibrated: most ideas land between 40 and 70. Reserve scores above 80 for
ideas with strong evidence of demand and a clear advantage. Community signals
(votes, discussion) are evidence about demand, not a verdict.
"
    };
}

macro_rules! output_shape {
    () => {
        "
Respond with a single JSON object and nothing else:
{
  \"score_breakdown\": {\"market_demand\": 0-10, \"market_timing\": 0-10, \"revenue_clarity\": 0-10,
    \"scalability\": 0-10, \"unique_value\": 0-10, \"competitive_moat\": 0-10,
    \"technical_feasibility\": 0-10, \"execution_complexity\": 0-10,
    \"market_risk\": 0-10, \"regulatory_risk\": 0-10},
  \"ai_summary\": \"2-3 short paragraphs assessing the opportunity\",
  \"strengths\": [\"at most 3 items\"],
  \"challenges\": [\"at most 3 items\"],
  \"target_market\": \"who would buy this\",
  \"suggested_next_steps\": [\"at most 3 items\"]
}"
    };
}

pub const ANALYSIS_SYSTEM_PROMPT: &str = concat!(
    "You are an experienced startup analyst evaluating the market potential of startup ideas.\n\n",
    rubric!(),
    output_shape!(),
);

/// System turn of every exported training conversation. Identical to the live
/// prompt so a fine-tuned model sees at inference what it saw in training.
pub const TRAINING_SYSTEM_PROMPT: &str = ANALYSIS_SYSTEM_PROMPT;

pub const QUICK_SCORE_SYSTEM_PROMPT: &str = "\
You are a startup analyst. Give the idea a single holistic market potential score
from 0 to 100 and a one-paragraph summary. Most ideas land between 40 and 70.
Respond with a single JSON object and nothing else:
{\"score\": 0-100, \"summary\": \"one paragraph\"}";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaText {
    pub title: String,
    pub description: String,
    pub body: Option<String>,
}

/// Where an idea was found, e.g. forum `reddit`, community `startups`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub forum: String,
    pub community: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub upvotes: i32,
    pub downvotes: i32,
    pub comments: i32,
}

/// Extra material folded into the user turn. Never changes the rubric.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisContext {
    pub source: Option<SourceInfo>,
    pub engagement: Option<EngagementCounts>,
    pub community_discussion: Option<String>,
}

impl AnalysisContext {
    pub fn with_discussion(text: Option<&str>) -> Self {
        Self {
            community_discussion: text.map(str::to_string),
            ..Self::default()
        }
    }
}

/// User turn for a full analysis. Also used verbatim for exported examples.
pub fn build_user_prompt(idea: &IdeaText, ctx: &AnalysisContext) -> String {
    let mut out = format!(
        "Title: {}\n\nDescription: {}",
        idea.title.trim(),
        idea.description.trim()
    );

    if let Some(body) = non_empty(idea.body.as_deref()) {
        out.push_str("\n\nDetails:\n");
        out.push_str(body);
    }

    if let Some(src) = &ctx.source {
        out.push_str("\n\nSource: ");
        match non_empty(src.community.as_deref()) {
            Some(c) => out.push_str(&format!("posted on {} in community \"{}\"", src.forum, c)),
            None => out.push_str(&format!("posted on {}", src.forum)),
        }
    }

    if let Some(e) = ctx.engagement {
        out.push_str(&format!(
            "\n\nCommunity engagement: {} upvotes, {} downvotes, {} comments",
            e.upvotes, e.downvotes, e.comments
        ));
    }

    if let Some(discussion) = non_empty(ctx.community_discussion.as_deref()) {
        out.push_str("\n\nCommunity discussion:\n");
        out.push_str(discussion);
    }

    out
}

pub fn build_quick_score_prompt(title: &str, description: &str) -> String {
    format!("Title: {}\n\nDescription: {}", title.trim(), description.trim())
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
