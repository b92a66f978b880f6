//! Execution delegate
//!
//! Languages the engine does not run natively are handed to an external
//! execution simulator. Whatever it answers is coerced into the same
//! [`ExecutionResult`] shape the engine produces.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::core::{
    EvaluationError, ExecutionResult, TestCase, MAX_EXECUTION_SCORE, RUNTIME_ERROR_SCORE_CAP,
};

/// Everything the simulator needs to pretend-execute a submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest<'a> {
    pub question: &'a str,
    pub code: &'a str,
    pub language: &'a str,
    pub test_cases: &'a [TestCase],
}

/// External collaborator that simulates execution
#[async_trait]
pub trait ExecutionSimulator: Send + Sync {
    /// Returns an `ExecutionResult`-shaped JSON value
    async fn simulate(&self, request: &SimulationRequest<'_>) -> Result<Value>;
}

/// Simulator reached over HTTP: POSTs the request as JSON, reads JSON back
pub struct HttpSimulator {
    url: String,
    http_client: reqwest::Client,
}

impl HttpSimulator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("answer-evaluator/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            url: url.into(),
            http_client,
        })
    }
}

#[async_trait]
impl ExecutionSimulator for HttpSimulator {
    async fn simulate(&self, request: &SimulationRequest<'_>) -> Result<Value> {
        debug!("Requesting simulated execution from {}", self.url);

        let response = self
            .http_client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach simulator at {}", self.url))?
            .error_for_status()
            .context("Simulator rejected the request")?;

        response
            .json::<Value>()
            .await
            .context("Simulator returned invalid JSON")
    }
}

/// Delegate execution to the simulator.
///
/// With no simulator configured this degrades to a zeroed result. Errors from
/// the simulator call itself are returned to the caller untouched.
pub async fn simulate_execution(
    question: &str,
    code: &str,
    language: &str,
    test_cases: &[TestCase],
    simulator: Option<&dyn ExecutionSimulator>,
) -> Result<ExecutionResult> {
    let Some(simulator) = simulator else {
        return Ok(unavailable_result(test_cases.len()));
    };

    let request = SimulationRequest {
        question,
        code,
        language,
        test_cases,
    };
    let raw = simulator.simulate(&request).await?;
    Ok(coerce_result(&raw))
}

/// Zeroed result used whenever the simulator cannot be used
pub fn unavailable_result(test_case_count: usize) -> ExecutionResult {
    ExecutionResult {
        test_cases_passed: 0,
        total_test_cases: test_case_count as u32,
        runtime_error: Some(EvaluationError::CollaboratorUnavailable.to_string()),
        execution_time_ms: 0,
        execution_score: 0,
    }
}

/// Coerce an arbitrary simulator answer into a valid result
pub fn coerce_result(raw: &Value) -> ExecutionResult {
    let field = |camel: &str, snake: &str| raw.get(camel).or_else(|| raw.get(snake));
    let count = |camel: &str, snake: &str| field(camel, snake).map(coerce_count).unwrap_or(0);

    let count32 = |camel: &str, snake: &str| saturate_u32(count(camel, snake));

    let total_test_cases = count32("totalTestCases", "total_test_cases");
    let test_cases_passed = count32("testCasesPassed", "test_cases_passed").min(total_test_cases);
    let execution_time_ms = count("executionTimeMs", "execution_time_ms");

    let runtime_error = field("runtimeError", "runtime_error").and_then(coerce_error);

    let mut execution_score =
        count32("executionScore", "execution_score").min(MAX_EXECUTION_SCORE);
    if runtime_error.is_some() {
        execution_score = execution_score.min(RUNTIME_ERROR_SCORE_CAP);
    }

    ExecutionResult {
        test_cases_passed,
        total_test_cases,
        runtime_error,
        execution_time_ms,
        execution_score,
    }
}

/// Reported error text. `null`, `false` and blank strings mean no error; any
/// other non-string value is kept as its JSON text.
fn coerce_error(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.trim().is_empty() => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn saturate_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Non-negative integer from a number or numeric string; anything else is 0
fn coerce_count(value: &Value) -> u64 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() && n > 0.0 => n.round() as u64,
        _ => 0,
    }
}
