//! Idea scoring core
//!
//! Ten-criterion rubric, deterministic aggregation, model-output repair and the
//! fine-tuning exchange format. Nothing in here performs I/O.

mod analysis;
mod breakdown;
mod export;
mod parse;
mod prompt;
mod schema;

pub use analysis::{IdeaAnalysis, QuickScore, MAX_LIST_ITEMS};
pub use breakdown::{aggregate, criterion_score, ScoreBreakdown, CRITERIA, DEFAULT_CRITERION_SCORE};
pub use export::{
    render_example, render_jsonl, split_for_validation, AnalysisTarget, ChatMessage, ExampleSource,
    TrainingExample, ANALYSIS_KEYS,
};
pub use parse::{parse_analysis, parse_quick_score, strip_code_fences, ParseError};
pub use prompt::{
    build_quick_score_prompt, build_user_prompt, AnalysisContext, EngagementCounts, IdeaText,
    SourceInfo, ANALYSIS_SYSTEM_PROMPT, QUICK_SCORE_SYSTEM_PROMPT, TRAINING_SYSTEM_PROMPT,
};
pub use schema::{analysis_json_schema, StructuredAnalysis};
