//! Resume vs. performance consistency
//!
//! Compares the skills a candidate claims against the topics they were
//! actually measured on. Skill names are matched loosely: after trimming and
//! lower-casing, two names match when either contains the other.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scores below this on a matched topic mark the claim as inflated
pub const INFLATED_BELOW: f64 = 5.0;
/// Topics scoring at least this are verified strengths
pub const VERIFIED_FROM: f64 = 7.0;

/// One measured topic and its score on the 0-10 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillPerformanceEntry {
    pub topic: String,
    pub score: f64,
}

impl SkillPerformanceEntry {
    pub fn new(topic: impl Into<String>, score: f64) -> Self {
        Self {
            topic: topic.into(),
            score,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    /// Share of claimed skills that were measured, in `[0, 100]`
    pub resume_claim_accuracy: u32,
    pub inflated_skills: Vec<String>,
    pub verified_strengths: Vec<String>,
    pub underutilized_skills: Vec<String>,
}

/// Reconcile claimed skills with measured performance
pub fn analyze<S: AsRef<str>>(
    claimed_skills: &[S],
    performance: &[SkillPerformanceEntry],
) -> ConsistencyReport {
    let claims = dedup(claimed_skills.iter().filter_map(|s| normalize_skill(s.as_ref())));
    let measured: Vec<(String, f64)> = performance
        .iter()
        .filter_map(|entry| normalize_skill(&entry.topic).map(|topic| (topic, entry.score)))
        .collect();

    let mut matched = 0usize;
    let mut inflated = Vec::new();
    let mut underutilized = Vec::new();

    for claim in &claims {
        match measured.iter().find(|(topic, _)| skills_match(claim, topic)) {
            Some((_, score)) => {
                matched += 1;
                if *score < INFLATED_BELOW {
                    inflated.push(display_form(claim));
                }
            }
            None => underutilized.push(display_form(claim)),
        }
    }

    let verified = measured
        .iter()
        .filter(|(_, score)| *score >= VERIFIED_FROM)
        .map(|(topic, _)| display_form(topic));

    let resume_claim_accuracy = if claims.is_empty() {
        0
    } else {
        (matched as f64 / claims.len() as f64 * 100.0).round() as u32
    };

    ConsistencyReport {
        resume_claim_accuracy,
        inflated_skills: dedup(inflated),
        verified_strengths: dedup(verified),
        underutilized_skills: dedup(underutilized),
    }
}

/// Skills and technologies listed on a stored resume.
///
/// Anything that is not an array of strings under `skills` or
/// `technologies` is skipped.
pub fn claimed_skills_from_resume(resume: &Value) -> Vec<String> {
    ["skills", "technologies"]
        .iter()
        .filter_map(|key| resume.get(*key).and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Performance entries from a `topic -> {score}` map.
///
/// A bare number is accepted in place of `{score}`; missing or
/// non-numeric scores count as 0.
pub fn performance_from_value(performance: &Value) -> Vec<SkillPerformanceEntry> {
    let Some(map) = performance.as_object() else {
        return Vec::new();
    };

    map.iter()
        .map(|(topic, entry)| {
            let score = entry.get("score").unwrap_or(entry);
            SkillPerformanceEntry::new(topic.as_str(), score_value(score))
        })
        .collect()
}

fn score_value(value: &Value) -> f64 {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    score.filter(|s| s.is_finite()).unwrap_or(0.0)
}

fn normalize_skill(skill: &str) -> Option<String> {
    let normalized = skill.trim().to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}

fn skills_match(claim: &str, topic: &str) -> bool {
    claim.contains(topic) || topic.contains(claim)
}

/// Capitalize the first character of every word: `node.js` -> `Node.Js`
fn display_form(skill: &str) -> String {
    let mut out = String::with_capacity(skill.len());
    let mut at_word_start = true;
    for c in skill.chars() {
        let is_word = c.is_alphanumeric() || c == '_';
        if is_word && at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !is_word;
    }
    out
}

/// Drop repeats, keeping first occurrences in order
fn dedup(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
