use serde_json::{Map, Value};
use thiserror::Error;

use crate::analysis::{cap, IdeaAnalysis, QuickScore, DEFAULT_TARGET_MARKET};
use crate::breakdown::ScoreBreakdown;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty model response")]
    Empty,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON object")]
    NotAnObject,
}

/// Removes a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string ("json", "JSON", ...) on the opening line
    let rest = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Lenient parse of a JSON-mode analysis. Every criterion is clamped, every
/// list capped and every missing field defaulted, so only unparseable text
/// is an error.
pub fn parse_analysis(raw: &str, description: &str) -> Result<IdeaAnalysis, ParseError> {
    let obj = parse_object(raw)?;
    let fallback = IdeaAnalysis::fallback(description);

    let breakdown = obj
        .get("score_breakdown")
        .or_else(|| obj.get("scoreBreakdown"))
        .filter(|v| v.is_object())
        .map(ScoreBreakdown::from_value)
        .unwrap_or_else(|| fallback.score_breakdown.clone());

    let ai_summary = string_field(&obj, &["ai_summary", "aiSummary", "summary"])
        .unwrap_or(fallback.ai_summary);
    let strengths = list_field(&obj, &["strengths"]).unwrap_or(fallback.strengths);
    let challenges = list_field(&obj, &["challenges"]).unwrap_or(fallback.challenges);
    let target_market = string_field(&obj, &["target_market", "targetMarket"])
        .unwrap_or_else(|| DEFAULT_TARGET_MARKET.to_string());
    let next_steps = list_field(&obj, &["suggested_next_steps", "suggestedNextSteps"])
        .unwrap_or(fallback.suggested_next_steps);

    Ok(IdeaAnalysis::new(
        breakdown,
        ai_summary,
        strengths,
        challenges,
        target_market,
        next_steps,
    ))
}

/// Lenient parse of a quick score: `score` clamped to 0..=100, 50 if absent.
pub fn parse_quick_score(raw: &str, description: &str) -> Result<QuickScore, ParseError> {
    let obj = parse_object(raw)?;

    let score = match obj.get("score") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
    .map(|f| f.round().clamp(0.0, 100.0) as u8)
    .unwrap_or(50);

    let summary = string_field(&obj, &["summary", "ai_summary"]).unwrap_or_else(|| description.to_string());

    Ok(QuickScore { score, summary })
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let value = match serde_json::from_str::<Value>(text) {
        Ok(v) => v,
        // models sometimes wrap the object in prose; retry on the outermost braces
        Err(e) => match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => serde_json::from_str(&text[start..=end])
                .map_err(|_| ParseError::InvalidJson(e.to_string()))?,
            _ => return Err(ParseError::InvalidJson(e.to_string())),
        },
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ParseError::NotAnObject),
    }
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn list_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<Vec<String>> {
    let items = keys.iter().find_map(|k| obj.get(*k))?.as_array()?;
    let items = cap(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .collect(),
    );
    (!items.is_empty()).then_some(items)
}
