//! Evaluation reliability scoring
//!
//! Estimates how far an upstream text evaluation can be trusted. The score of
//! that evaluation is not touched; only a confidence coefficient is produced.

use serde::{Deserialize, Serialize};

/// Phrases that signal a generic, low-information answer
pub const FILLER_PHRASES: [&str; 7] = [
    "good answer",
    "it depends",
    "best practice",
    "in general",
    "optimize",
    "scalable",
    "industry standard",
];

const SHORT_RESPONSE_CHARS: usize = 40;
const SHORT_RESPONSE_PENALTY: f64 = 0.35;
const BRIEF_RESPONSE_CHARS: usize = 100;
const BRIEF_RESPONSE_PENALTY: f64 = 0.20;

const FILLER_PHRASE_PENALTY: f64 = 0.08;
const MAX_FILLER_PENALTY: f64 = 0.25;

const HIGH_VARIANCE_STDDEV: f64 = 2.5;
const HIGH_VARIANCE_PENALTY: f64 = 0.20;
const MODERATE_VARIANCE_STDDEV: f64 = 1.5;
const MODERATE_VARIANCE_PENALTY: f64 = 0.10;

const MIN_RELIABILITY: f64 = 0.10;
const MAX_RELIABILITY: f64 = 1.00;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityReport {
    /// In `[0.10, 1.00]`, two decimals
    pub evaluation_reliability: f64,
    /// `round(evaluation_reliability * 100)`
    pub ai_confidence_score: u32,
    /// Characters in the trimmed response
    pub response_length: u32,
}

/// Score the reliability of an evaluation of `response`.
///
/// `attempt_scores` are the scores of repeated evaluations of the same
/// response; fewer than two disables the variance check.
pub fn calculate(response: &str, attempt_scores: &[f64]) -> ReliabilityReport {
    let trimmed = response.trim();
    let response_length = trimmed.chars().count();

    let penalty = length_penalty(response_length)
        + filler_penalty(trimmed)
        + variance_penalty(attempt_scores);

    let reliability = round2((MAX_RELIABILITY - penalty).clamp(MIN_RELIABILITY, MAX_RELIABILITY));

    ReliabilityReport {
        evaluation_reliability: reliability,
        ai_confidence_score: (reliability * 100.0).round() as u32,
        response_length: response_length as u32,
    }
}

fn length_penalty(chars: usize) -> f64 {
    if chars < SHORT_RESPONSE_CHARS {
        SHORT_RESPONSE_PENALTY
    } else if chars < BRIEF_RESPONSE_CHARS {
        BRIEF_RESPONSE_PENALTY
    } else {
        0.0
    }
}

/// Each filler phrase counts once, however often it appears
fn filler_penalty(response: &str) -> f64 {
    let lowered = response.to_lowercase();
    let present = FILLER_PHRASES
        .iter()
        .filter(|phrase| lowered.contains(*phrase))
        .count();

    (present as f64 * FILLER_PHRASE_PENALTY).min(MAX_FILLER_PENALTY)
}

fn variance_penalty(attempt_scores: &[f64]) -> f64 {
    let scores: Vec<f64> = attempt_scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .collect();
    if scores.len() < 2 {
        return 0.0;
    }

    let stddev = population_stddev(&scores);
    if stddev > HIGH_VARIANCE_STDDEV {
        HIGH_VARIANCE_PENALTY
    } else if stddev > MODERATE_VARIANCE_STDDEV {
        MODERATE_VARIANCE_PENALTY
    } else {
        0.0
    }
}

fn population_stddev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
