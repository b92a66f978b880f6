use serde::{Deserialize, Serialize};

/// Highest score a submission can receive
pub const MAX_EXECUTION_SCORE: u32 = 10;

/// Ceiling applied when the run ended in a runtime error
pub const RUNTIME_ERROR_SCORE_CAP: u32 = 3;

/// Outcome of executing one coding submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub test_cases_passed: u32,
    pub total_test_cases: u32,
    pub runtime_error: Option<String>,
    pub execution_time_ms: u64,
    pub execution_score: u32,
}

impl ExecutionResult {
    /// Build a result, deriving the score from the pass ratio.
    pub fn scored(
        test_cases_passed: u32,
        total_test_cases: u32,
        runtime_error: Option<String>,
        execution_time_ms: u64,
    ) -> Self {
        let test_cases_passed = test_cases_passed.min(total_test_cases);
        let mut execution_score = execution_score(test_cases_passed, total_test_cases);
        if runtime_error.is_some() {
            execution_score = execution_score.min(RUNTIME_ERROR_SCORE_CAP);
        }

        Self {
            test_cases_passed,
            total_test_cases,
            runtime_error,
            execution_time_ms,
            execution_score,
        }
    }

    /// Result for a run that produced no credit at all
    pub fn failed(total_test_cases: u32, message: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            test_cases_passed: 0,
            total_test_cases,
            runtime_error: Some(message.into()),
            execution_time_ms,
            execution_score: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.runtime_error.is_none() && self.test_cases_passed == self.total_test_cases
    }
}

/// `round(passed / total * 10)`, or 0 for an empty suite
pub fn execution_score(passed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let ratio = f64::from(passed.min(total)) / f64::from(total);
    (ratio * f64::from(MAX_EXECUTION_SCORE)).round() as u32
}
