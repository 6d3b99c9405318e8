use std::collections::HashSet;

use scoring::{TrainingExample, ANALYSIS_KEYS};
use serde::Serialize;
use serde_json::Value;

const EXPECTED_ROLES: [&str; 3] = ["system", "user", "assistant"];

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct QualityReport {
    pub score: u8,
    pub warnings: Vec<String>,
    pub duplicate_rate: f32,
    pub avg_user_len: u32,
    pub avg_assistant_len: u32,
    pub too_short_count: u64,
}

#[derive(Clone, Debug)]
pub struct ValidationStats {
    pub examples: u64,
    /// blake3 over every line plus its newline, hex encoded.
    pub dataset_hash: String,
    pub quality: QualityReport,
}

/// Checks rendered chat-format lines before they are uploaded. Any structural
/// problem is a hard error; quality issues only produce warnings.
pub fn validate_chat_jsonl(lines: &[String]) -> Result<ValidationStats, Vec<String>> {
    let mut errors: Vec<String> = vec![];
    let mut hasher = blake3::Hasher::new();

    let mut count: u64 = 0;
    let mut user_sum: u64 = 0;
    let mut assistant_sum: u64 = 0;
    let mut too_short: u64 = 0;

    let mut seen = HashSet::<[u8; 32]>::new();
    let mut dupes: u64 = 0;

    for (i, line) in lines.iter().enumerate() {
        let line_no = i + 1;

        hasher.update(line.as_bytes());
        hasher.update(b"\n");

        if line.trim().is_empty() {
            errors.push(format!("Line {line_no}: empty line"));
            continue;
        }
        if line.contains('\n') {
            errors.push(format!("Line {line_no}: embedded newline"));
            continue;
        }

        let ex: TrainingExample = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                errors.push(format!("Line {line_no}: invalid JSON: {e}"));
                continue;
            }
        };

        let roles: Vec<&str> = ex.messages.iter().map(|m| m.role.as_str()).collect();
        if roles != EXPECTED_ROLES {
            errors.push(format!(
                "Line {line_no}: expected roles system/user/assistant, got {}",
                roles.join("/")
            ));
            continue;
        }
        if let Some(m) = ex.messages.iter().find(|m| m.content.trim().is_empty()) {
            errors.push(format!("Line {line_no}: empty {} message", m.role));
            continue;
        }

        let user = ex.messages[1].content.trim();
        let assistant = ex.messages[2].content.trim();

        match serde_json::from_str::<Value>(assistant) {
            Ok(Value::Object(obj)) => {
                let missing: Vec<&str> = ANALYSIS_KEYS
                    .iter()
                    .copied()
                    .filter(|k| !obj.contains_key(*k))
                    .collect();
                if !missing.is_empty() {
                    errors.push(format!(
                        "Line {line_no}: assistant answer missing {}",
                        missing.join(", ")
                    ));
                    continue;
                }
            }
            _ => {
                errors.push(format!("Line {line_no}: assistant answer is not a JSON object"));
                continue;
            }
        }

        if user.len() < 40 {
            too_short += 1;
        }

        let fp = blake3::hash(format!("{user}\n{assistant}").as_bytes()).into();
        if !seen.insert(fp) {
            dupes += 1;
        }

        count += 1;
        user_sum += user.len() as u64;
        assistant_sum += assistant.len() as u64;
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    if count == 0 {
        return Err(vec!["No valid examples found".to_string()]);
    }

    let dataset_hash = hex::encode(hasher.finalize().as_bytes());

    let avg_user = (user_sum / count) as u32;
    let avg_assistant = (assistant_sum / count) as u32;
    let duplicate_rate = (dupes as f32) / (count as f32);

    let mut score: i32 = 100;
    let mut warnings: Vec<String> = vec![];

    if count < 50 {
        score -= 25;
        warnings.push(format!("Low example count ({count}). Recommended: 50+"));
    }
    if duplicate_rate > 0.10 {
        score -= 25;
        warnings.push(format!("High duplicate_rate ({duplicate_rate:.2}). Consider deduping"));
    }
    if too_short > (count / 5) {
        score -= 20;
        warnings.push(format!("Many ideas with very little text ({too_short})"));
    }

    Ok(ValidationStats {
        examples: count,
        dataset_hash,
        quality: QualityReport {
            score: score.clamp(0, 100) as u8,
            warnings,
            duplicate_rate,
            avg_user_len: avg_user,
            avg_assistant_len: avg_assistant,
            too_short_count: too_short,
        },
    })
}
