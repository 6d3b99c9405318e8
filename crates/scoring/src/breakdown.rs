use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value used for any criterion that is missing, non-numeric or outside 0..=10.
pub const DEFAULT_CRITERION_SCORE: u8 = 5;

const MAX_CRITERION_SCORE: u8 = 10;
const MAX_TOTAL_SCORE: u32 = 100;

/// Criterion keys in rubric order (two per 20-point group).
pub const CRITERIA: [&str; 10] = [
    "market_demand",
    "market_timing",
    "revenue_clarity",
    "scalability",
    "unique_value",
    "competitive_moat",
    "technical_feasibility",
    "execution_complexity",
    "market_risk",
    "regulatory_risk",
];

/// Per-criterion scores, each 0..=10.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    // Market & Timing
    pub market_demand: u8,
    pub market_timing: u8,
    // Business Viability
    pub revenue_clarity: u8,
    pub scalability: u8,
    // Competitive Position
    pub unique_value: u8,
    pub competitive_moat: u8,
    // Execution
    pub technical_feasibility: u8,
    pub execution_complexity: u8,
    // Risk
    pub market_risk: u8,
    pub regulatory_risk: u8,
}

impl ScoreBreakdown {
    pub fn uniform(score: u8) -> Self {
        Self {
            market_demand: score,
            market_timing: score,
            revenue_clarity: score,
            scalability: score,
            unique_value: score,
            competitive_moat: score,
            technical_feasibility: score,
            execution_complexity: score,
            market_risk: score,
            regulatory_risk: score,
        }
    }

    /// Builds a breakdown from loosely-typed model output. Each key goes through
    /// [`criterion_score`], so a missing or out-of-range value becomes 5.
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| criterion_score(value.get(key));
        Self {
            market_demand: field("market_demand"),
            market_timing: field("market_timing"),
            revenue_clarity: field("revenue_clarity"),
            scalability: field("scalability"),
            unique_value: field("unique_value"),
            competitive_moat: field("competitive_moat"),
            technical_feasibility: field("technical_feasibility"),
            execution_complexity: field("execution_complexity"),
            market_risk: field("market_risk"),
            regulatory_risk: field("regulatory_risk"),
        }
    }

    /// Same as [`ScoreBreakdown::from_value`] but for already-integer input,
    /// e.g. a schema-validated response.
    pub fn from_raw(raw: [i64; 10]) -> Self {
        let [a, b, c, d, e, f, g, h, i, j] = raw.map(normalize);
        Self {
            market_demand: a,
            market_timing: b,
            revenue_clarity: c,
            scalability: d,
            unique_value: e,
            competitive_moat: f,
            technical_feasibility: g,
            execution_complexity: h,
            market_risk: i,
            regulatory_risk: j,
        }
    }

    pub fn values(&self) -> [(&'static str, u8); 10] {
        [
            (CRITERIA[0], self.market_demand),
            (CRITERIA[1], self.market_timing),
            (CRITERIA[2], self.revenue_clarity),
            (CRITERIA[3], self.scalability),
            (CRITERIA[4], self.unique_value),
            (CRITERIA[5], self.competitive_moat),
            (CRITERIA[6], self.technical_feasibility),
            (CRITERIA[7], self.execution_complexity),
            (CRITERIA[8], self.market_risk),
            (CRITERIA[9], self.regulatory_risk),
        ]
    }

    pub fn total(&self) -> u8 {
        aggregate(self)
    }

    /// Copy with every criterion forced into 0..=10.
    pub fn normalized(&self) -> Self {
        let v = self.values().map(|(_, s)| i64::from(s));
        Self::from_raw(v)
    }
}

/// Total score: every criterion normalized, summed, then capped at 100.
pub fn aggregate(breakdown: &ScoreBreakdown) -> u8 {
    let sum: u32 = breakdown
        .values()
        .iter()
        .map(|(_, s)| u32::from(normalize(i64::from(*s))))
        .sum();
    sum.min(MAX_TOTAL_SCORE) as u8
}

/// Reads one criterion from model output. Integers and floats inside 0..=10
/// are accepted (floats rounded); numeric strings are tolerated; anything
/// else is replaced by [`DEFAULT_CRITERION_SCORE`].
pub fn criterion_score(value: Option<&Value>) -> u8 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() && (0.0..=f64::from(MAX_CRITERION_SCORE)).contains(&f) => {
            f.round() as u8
        }
        _ => DEFAULT_CRITERION_SCORE,
    }
}

fn normalize(raw: i64) -> u8 {
    if (0..=i64::from(MAX_CRITERION_SCORE)).contains(&raw) {
        raw as u8
    } else {
        DEFAULT_CRITERION_SCORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn total_is_sum_of_criteria() {
        let b = ScoreBreakdown {
            market_demand: 8,
            market_timing: 7,
            revenue_clarity: 6,
            scalability: 9,
            unique_value: 5,
            competitive_moat: 4,
            technical_feasibility: 10,
            execution_complexity: 3,
            market_risk: 2,
            regulatory_risk: 1,
        };
        assert_eq!(aggregate(&b), 55);
        assert_eq!(b.total(), 55);
    }

    #[test]
    fn total_stays_within_bounds() {
        assert_eq!(aggregate(&ScoreBreakdown::uniform(0)), 0);
        assert_eq!(aggregate(&ScoreBreakdown::uniform(10)), 100);
        // out-of-range criteria fall back to 5 rather than inflating the total
        assert_eq!(aggregate(&ScoreBreakdown::uniform(200)), 50);
    }

    #[test]
    fn negative_criterion_defaults_to_five() {
        let mut v = json!({});
        for key in CRITERIA {
            v[key] = json!(10);
        }
        v["market_demand"] = json!(-3);

        let b = ScoreBreakdown::from_value(&v);
        assert_eq!(b.market_demand, 5);
        assert_eq!(b.total(), 95);
    }

    #[test]
    fn missing_and_invalid_criteria_default_to_five() {
        let v = json!({
            "market_demand": 9,
            "market_timing": "7",
            "revenue_clarity": 11,
            "scalability": null,
            "unique_value": 6.6,
            "competitive_moat": "high",
        });
        let b = ScoreBreakdown::from_value(&v);
        assert_eq!(b.market_demand, 9);
        assert_eq!(b.market_timing, 7);
        assert_eq!(b.revenue_clarity, 5);
        assert_eq!(b.scalability, 5);
        assert_eq!(b.unique_value, 7);
        assert_eq!(b.competitive_moat, 5);
        assert_eq!(b.technical_feasibility, 5);
        assert_eq!(b.total(), 9 + 7 + 5 + 5 + 7 + 5 + 5 + 5 + 5 + 5);
    }

    #[test]
    fn from_raw_normalizes() {
        let b = ScoreBreakdown::from_raw([10, -1, 3, 12, 0, 4, 4, 4, 4, 4]);
        assert_eq!(b.market_timing, 5);
        assert_eq!(b.scalability, 5);
        assert_eq!(b.unique_value, 0);
        assert_eq!(b.total(), 10 + 5 + 3 + 5 + 0 + 4 * 5);
    }

    #[test]
    fn values_follow_rubric_order() {
        let keys: Vec<&str> = ScoreBreakdown::default().values().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, CRITERIA.to_vec());
    }
}
