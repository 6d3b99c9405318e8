//! Schema for provider-side structured output.
//!
//! Strict mode on OpenAI-compatible APIs needs `additionalProperties: false`
//! on every object, every property listed in `required`, and no `$ref`s.

use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;

use crate::analysis::IdeaAnalysis;
use crate::breakdown::ScoreBreakdown;

/// Criterion scores as the model returns them. Kept signed so out-of-range
/// values survive deserialization and are normalized afterwards.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RawBreakdown {
    pub market_demand: i64,
    pub market_timing: i64,
    pub revenue_clarity: i64,
    pub scalability: i64,
    pub unique_value: i64,
    pub competitive_moat: i64,
    pub technical_feasibility: i64,
    pub execution_complexity: i64,
    pub market_risk: i64,
    pub regulatory_risk: i64,
}

/// Response body requested from the model in strict-schema mode.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StructuredAnalysis {
    pub score_breakdown: RawBreakdown,
    /// Two to three paragraphs.
    pub ai_summary: String,
    /// At most three.
    pub strengths: Vec<String>,
    /// At most three.
    pub challenges: Vec<String>,
    pub target_market: String,
    /// At most three.
    pub suggested_next_steps: Vec<String>,
}

impl StructuredAnalysis {
    pub fn into_analysis(self) -> IdeaAnalysis {
        let b = self.score_breakdown;
        IdeaAnalysis::new(
            ScoreBreakdown::from_raw([
                b.market_demand,
                b.market_timing,
                b.revenue_clarity,
                b.scalability,
                b.unique_value,
                b.competitive_moat,
                b.technical_feasibility,
                b.execution_complexity,
                b.market_risk,
                b.regulatory_risk,
            ]),
            self.ai_summary,
            self.strengths,
            self.challenges,
            self.target_market,
            self.suggested_next_steps,
        )
    }
}

/// Strict-mode JSON schema for [`StructuredAnalysis`].
pub fn analysis_json_schema() -> Value {
    let mut value = serde_json::to_value(schema_for!(StructuredAnalysis)).unwrap_or_default();

    fix_object_schemas(&mut value);
    let definitions = value.get("definitions").cloned();
    if let Some(defs) = definitions {
        inline_refs(&mut value, &defs);
    }
    if let Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$schema");
        map.remove("title");
    }
    value
}

fn fix_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            // integer formats such as int64 are not accepted in strict mode
            map.remove("format");
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                if let Some(Value::Object(props)) = map.get("properties") {
                    let keys = props.keys().cloned().map(Value::String).collect();
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }
            for v in map.values_mut() {
                fix_object_schemas(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(fix_object_schemas),
        _ => {}
    }
}

fn inline_refs(value: &mut Value, definitions: &Value) {
    let target = value
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.strip_prefix("#/definitions/"))
        .and_then(|name| definitions.get(name))
        .cloned();
    if let Some(def) = target {
        *value = def;
        inline_refs(value, definitions);
        return;
    }

    match value {
        Value::Object(map) => map.values_mut().for_each(|v| inline_refs(v, definitions)),
        Value::Array(items) => items.iter_mut().for_each(|v| inline_refs(v, definitions)),
        _ => {}
    }
}
