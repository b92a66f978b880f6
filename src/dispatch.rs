//! Language dispatch for coding submissions
//!
//! `javascript` (any letter case) runs on the sandboxed engine; every other
//! language goes to the execution simulator. Both paths return the same
//! [`ExecutionResult`] and neither ever fails.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::EvaluatorConfig;
use crate::core::{normalize_test_cases, ExecutionResult};
use crate::delegate::{simulate_execution, unavailable_result, ExecutionSimulator, HttpSimulator};
use crate::engine::ExecutionEngine;
use crate::runner::{Runner, SandboxedRunner};

/// The one language executed natively
pub const NATIVE_LANGUAGE: &str = "javascript";

pub fn is_native_language(language: &str) -> bool {
    language.eq_ignore_ascii_case(NATIVE_LANGUAGE)
}

/// One coding answer as supplied by the question/answer store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSubmission {
    #[serde(default)]
    pub question: String,
    pub code: String,
    pub language: String,
    /// Raw test cases; normalized before use
    #[serde(default, alias = "test_cases")]
    pub test_cases: Value,
}

pub struct CodeEvaluator<R = SandboxedRunner> {
    engine: ExecutionEngine<R>,
    simulator: Option<Arc<dyn ExecutionSimulator>>,
    simulator_timeout: Duration,
}

impl CodeEvaluator<SandboxedRunner> {
    /// Build from configuration; the HTTP simulator is enabled when a URL is set
    pub fn from_config(config: &EvaluatorConfig) -> anyhow::Result<Self> {
        let simulator_timeout = Duration::from_millis(config.simulator.timeout_ms);
        let simulator = match &config.simulator.url {
            Some(url) => {
                info!("Execution simulator enabled at {}", url);
                let simulator: Arc<dyn ExecutionSimulator> =
                    Arc::new(HttpSimulator::new(url.clone(), simulator_timeout)?);
                Some(simulator)
            }
            None => {
                info!("Execution simulator disabled; non-native languages degrade");
                None
            }
        };

        Ok(Self::new(
            ExecutionEngine::new(config.execution.clone()),
            simulator,
            simulator_timeout,
        ))
    }
}

impl<R: Runner> CodeEvaluator<R> {
    pub fn new(
        engine: ExecutionEngine<R>,
        simulator: Option<Arc<dyn ExecutionSimulator>>,
        simulator_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            simulator,
            simulator_timeout,
        }
    }

    /// Evaluate one coding submission
    pub async fn evaluate(&self, submission: &CodeSubmission) -> ExecutionResult {
        if is_native_language(&submission.language) {
            return self
                .engine
                .execute(&submission.code, &submission.test_cases)
                .await;
        }

        let test_cases = normalize_test_cases(&submission.test_cases);

        let simulation = simulate_execution(
            &submission.question,
            &submission.code,
            &submission.language,
            &test_cases,
            self.simulator.as_deref(),
        );

        match tokio::time::timeout(self.simulator_timeout, simulation).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(
                    "Execution simulator failed for language {}: {:#}",
                    submission.language, e
                );
                unavailable_result(test_cases.len())
            }
            Err(_) => {
                warn!(
                    "Execution simulator timed out after {} ms",
                    self.simulator_timeout.as_millis()
                );
                unavailable_result(test_cases.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionConfig;
    use crate::core::EvaluationError;
    use crate::delegate::SimulationRequest;
    use crate::runner::{CommandSpec, RunLimits, RunOutcome, RunStatus};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts engine invocations and answers with a passing harness response
    #[derive(Default)]
    struct CountingRunner {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Runner for CountingRunner {
        async fn run(
            &self,
            _cmd: &CommandSpec,
            _limits: &RunLimits,
            _stdin: Option<&str>,
        ) -> anyhow::Result<RunOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RunOutcome {
                time_ms: 1,
                stdout: format!(
                    "{}{}",
                    crate::engine::harness::RESPONSE_SENTINEL,
                    json!({
                        "kind": "completed",
                        "entryPoint": "solve",
                        "outcomes": [{"status": "returned", "defined": true, "value": 5}],
                    })
                ),
                stderr: String::new(),
                status: RunStatus::Exited(0),
            })
        }
    }

    enum Behaviour {
        Answer(Value),
        Fail,
        Hang,
    }

    struct StubSimulator(Behaviour);

    #[async_trait]
    impl ExecutionSimulator for StubSimulator {
        async fn simulate(&self, _request: &SimulationRequest<'_>) -> anyhow::Result<Value> {
            match &self.0 {
                Behaviour::Answer(v) => Ok(v.clone()),
                Behaviour::Fail => anyhow::bail!("upstream 503"),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Value::Null)
                }
            }
        }
    }

    fn evaluator(simulator: Option<StubSimulator>) -> CodeEvaluator<CountingRunner> {
        let engine = ExecutionEngine::with_runner(CountingRunner::default(), ExecutionConfig::default());
        let simulator = simulator.map(|s| Arc::new(s) as Arc<dyn ExecutionSimulator>);
        CodeEvaluator::new(engine, simulator, Duration::from_millis(100))
    }

    fn submission(language: &str) -> CodeSubmission {
        CodeSubmission {
            question: "Add two numbers".into(),
            code: "function solve(a, b) { return a + b; }".into(),
            language: language.into(),
            test_cases: json!([{"input": [2, 3], "expectedOutput": 5}]),
        }
    }

    #[test]
    fn test_native_language_match() {
        assert!(is_native_language("javascript"));
        assert!(is_native_language("JavaScript"));
        assert!(!is_native_language("js"));
        assert!(!is_native_language("typescript"));
        assert!(!is_native_language(" javascript"));
    }

    #[tokio::test]
    async fn test_javascript_goes_to_engine() {
        let evaluator = evaluator(None);
        let result = evaluator.evaluate(&submission("JAVASCRIPT")).await;

        assert_eq!(evaluator.engine_calls(), 1);
        assert_eq!(result.execution_score, 10);
    }

    #[tokio::test]
    async fn test_other_language_without_simulator() {
        let evaluator = evaluator(None);
        let result = evaluator.evaluate(&submission("python")).await;

        assert_eq!(evaluator.engine_calls(), 0);
        assert_eq!(result.total_test_cases, 1);
        assert_eq!(
            result.runtime_error,
            Some(EvaluationError::CollaboratorUnavailable.to_string())
        );
    }

    #[tokio::test]
    async fn test_other_language_uses_simulator() {
        let evaluator = evaluator(Some(StubSimulator(Behaviour::Answer(json!({
            "testCasesPassed": 1,
            "totalTestCases": 1,
            "runtimeError": null,
            "executionTimeMs": 3,
            "executionScore": 10,
        })))));
        let result = evaluator.evaluate(&submission("java")).await;

        assert_eq!(evaluator.engine_calls(), 0);
        assert_eq!(result.execution_score, 10);
        assert_eq!(result.runtime_error, None);
    }

    #[tokio::test]
    async fn test_simulator_failure_and_timeout_degrade() {
        for behaviour in [Behaviour::Fail, Behaviour::Hang] {
            let evaluator = evaluator(Some(StubSimulator(behaviour)));
            let result = evaluator.evaluate(&submission("cpp")).await;

            assert_eq!(result.test_cases_passed, 0);
            assert_eq!(result.total_test_cases, 1);
            assert_eq!(result.execution_score, 0);
            assert_eq!(
                result.runtime_error,
                Some(EvaluationError::CollaboratorUnavailable.to_string())
            );
        }
    }

    #[test]
    fn test_submission_accepts_snake_case_cases() {
        let submission: CodeSubmission = serde_json::from_value(json!({
            "code": "x",
            "language": "python",
            "test_cases": [{"input": 1}],
        }))
        .unwrap();

        assert_eq!(submission.question, "");
        assert_eq!(normalize_test_cases(&submission.test_cases).len(), 1);
    }

    impl CodeEvaluator<CountingRunner> {
        fn engine_calls(&self) -> usize {
            self.engine.runner().calls.load(Ordering::SeqCst)
        }
    }
}
