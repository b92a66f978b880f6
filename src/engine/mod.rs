//! Sandboxed execution engine
//!
//! Runs one JavaScript submission against its test cases:
//! - The submission is loaded by `harness.js` in a fresh Node.js process
//!   through a [`Runner`], one process per submission
//! - Entry-point resolution follows [`ENTRY_POINT_STRATEGIES`]
//! - Cases run strictly in order and stop at the first runtime fault
//! - Outputs are compared and scored here, on the Rust side
//!
//! Every failure is folded into an [`ExecutionResult`]; nothing is returned
//! as an error.

pub mod entry_point;
pub mod harness;

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::checker::check_case;
use crate::config::ExecutionConfig;
use crate::core::{normalize_test_cases, EvaluationError, ExecutionResult, TestCase};
use crate::runner::{CommandSpec, RunLimits, RunStatus, Runner, SandboxedRunner};

pub use entry_point::ENTRY_POINT_STRATEGIES;
use entry_point::describe_strategies;
use harness::{
    parse_response, CaseOutcome, HarnessRequest, HarnessResponse, HARNESS_FILE, HARNESS_SOURCE,
};

pub struct ExecutionEngine<R = SandboxedRunner> {
    runner: R,
    config: ExecutionConfig,
}

impl ExecutionEngine<SandboxedRunner> {
    pub fn new(config: ExecutionConfig) -> Self {
        Self::with_runner(SandboxedRunner::new(), config)
    }
}

impl<R: Runner> ExecutionEngine<R> {
    pub fn with_runner(runner: R, config: ExecutionConfig) -> Self {
        Self { runner, config }
    }

    /// Normalize raw test cases, then run the suite
    pub async fn execute(&self, source: &str, raw_test_cases: &Value) -> ExecutionResult {
        let test_cases = normalize_test_cases(raw_test_cases);
        self.run_test_suite(source, &test_cases).await
    }

    /// Run `source` against `test_cases`, substituting a smoke test for an
    /// empty suite.
    pub async fn run_test_suite(&self, source: &str, test_cases: &[TestCase]) -> ExecutionResult {
        let smoke_test;
        let cases = if test_cases.is_empty() {
            smoke_test = [TestCase::smoke_test()];
            &smoke_test[..]
        } else {
            test_cases
        };
        let total = cases.len() as u32;

        let started = Instant::now();
        let response = self.run_harness(source, cases).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = match response {
            Ok(response) => {
                score_response(response, cases, self.config.resolution_timeout_ms, elapsed_ms)
            }
            Err(err) => {
                warn!("Execution failed before any case ran: {}", err);
                ExecutionResult::failed(total, err.to_string(), elapsed_ms)
            }
        };

        info!(
            "Execution summary: passed={}/{}, score={}, time_ms={}, runtime_error={}",
            result.test_cases_passed,
            result.total_test_cases,
            result.execution_score,
            result.execution_time_ms,
            result.runtime_error.is_some()
        );

        result
    }

    async fn run_harness(
        &self,
        source: &str,
        cases: &[TestCase],
    ) -> Result<HarnessResponse, EvaluationError> {
        let protocol = |e: anyhow::Error| EvaluationError::HarnessProtocol(format!("{:#}", e));

        // Dropped at the end of the call, taking the run directory with it.
        let run_dir = tempfile::tempdir().map_err(|e| protocol(e.into()))?;
        tokio::fs::write(run_dir.path().join(HARNESS_FILE), HARNESS_SOURCE)
            .await
            .map_err(|e| protocol(e.into()))?;

        let request = HarnessRequest::new(source, &ENTRY_POINT_STRATEGIES, cases, &self.config);
        let stdin = serde_json::to_string(&request).map_err(|e| protocol(e.into()))?;

        let cmd = CommandSpec::new(&self.config.node_binary)
            .with_args([
                format!("--max-old-space-size={}", self.config.memory_limit_mb),
                HARNESS_FILE.to_string(),
            ])
            .with_work_dir(run_dir.path());
        let limits = RunLimits::new(self.config.suite_wall_time_ms, self.config.memory_limit_mb);

        let outcome = self
            .runner
            .run(&cmd, &limits, Some(&stdin))
            .await
            .map_err(protocol)?;

        if outcome.status == RunStatus::TimeLimitExceeded {
            return Err(EvaluationError::SuiteTimeout(self.config.suite_wall_time_ms));
        }

        if !outcome.is_success() {
            debug!(
                "Harness exited with {:?} after {} ms",
                outcome.status, outcome.time_ms
            );
        }

        parse_response(&outcome.stdout).map_err(|reason| {
            let stderr: String = outcome.stderr.trim().chars().take(300).collect();
            debug!("Harness stderr: {}", stderr);
            EvaluationError::HarnessProtocol(format!(
                "{} (exit code {}){}",
                reason,
                outcome.exit_code(),
                if stderr.is_empty() {
                    String::new()
                } else {
                    format!(": {}", stderr)
                }
            ))
        })
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }
}

/// Turn the harness response into a scored result
fn score_response(
    response: HarnessResponse,
    cases: &[TestCase],
    resolution_timeout_ms: u64,
    elapsed_ms: u64,
) -> ExecutionResult {
    let total = cases.len() as u32;

    let outcomes = match response {
        HarnessResponse::Completed {
            entry_point,
            outcomes,
        } => {
            debug!("Resolved entry point: {}", entry_point);
            outcomes
        }
        HarnessResponse::NoEntryPoint => {
            let err = EvaluationError::NoEntryPoint(describe_strategies(&ENTRY_POINT_STRATEGIES));
            return ExecutionResult::failed(total, err.to_string(), elapsed_ms);
        }
        HarnessResponse::ResolutionError { message } => {
            let err = EvaluationError::ResolutionFailed(message);
            return ExecutionResult::failed(total, err.to_string(), elapsed_ms);
        }
        HarnessResponse::ResolutionTimeout => {
            let err = EvaluationError::ResolutionTimeout(resolution_timeout_ms);
            return ExecutionResult::failed(total, err.to_string(), elapsed_ms);
        }
    };

    if outcomes.len() > cases.len() {
        warn!(
            "Harness reported {} outcomes for {} cases, ignoring the extra",
            outcomes.len(),
            cases.len()
        );
    }

    let mut passed = 0u32;
    let mut runtime_error = None;

    for (case, outcome) in cases.iter().zip(&outcomes) {
        match outcome {
            CaseOutcome::Returned { .. } => {
                if check_case(case.expected_output.as_ref(), outcome.actual()) {
                    passed += 1;
                }
            }
            CaseOutcome::Threw { message } => {
                let err = EvaluationError::RuntimeFault {
                    description: case.description.clone(),
                    message: message.clone(),
                };
                debug!("{}", err);
                runtime_error = Some(err.to_string());
                break;
            }
        }
    }

    if runtime_error.is_none() && outcomes.len() < cases.len() {
        warn!(
            "Harness reported {} outcomes for {} cases without a fault",
            outcomes.len(),
            cases.len()
        );
    }

    ExecutionResult::scored(passed, total, runtime_error, elapsed_ms)
}


/// Runs real submissions through Node.js; skipped when no runtime is installed.
#[cfg(test)]
mod node_tests {
    use super::*;
    use serde_json::json;

    fn node_available() -> bool {
        std::process::Command::new("node")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn engine() -> ExecutionEngine {
        ExecutionEngine::new(ExecutionConfig {
            suite_wall_time_ms: 8_000,
            ..ExecutionConfig::default()
        })
    }

    #[tokio::test]
    async fn test_solve_adds_numbers() {
        if !node_available() {
            return;
        }
        let result = engine()
            .execute(
                "function solve(a,b){return a+b;}",
                &json!([{"input": [2, 3], "expectedOutput": 5}]),
            )
            .await;

        assert_eq!(result.test_cases_passed, 1);
        assert_eq!(result.total_test_cases, 1);
        assert_eq!(result.execution_score, 10);
        assert_eq!(result.runtime_error, None);
    }

    #[tokio::test]
    async fn test_entry_point_shapes() {
        if !node_available() {
            return;
        }
        let cases = json!([{"input": [4], "expectedOutput": 16}]);
        let sources = [
            "const solution = (n) => n * n;",
            "module.exports = function (n) { return n * n; };",
            "exports.solve = (n) => n * n;",
            "module.exports = { solve(n) { return n * n; } };",
        ];

        for source in sources {
            let result = engine().execute(source, &cases).await;
            assert_eq!(result.execution_score, 10, "source: {}", source);
        }
    }

    #[tokio::test]
    async fn test_named_binding_wins_over_export() {
        if !node_available() {
            return;
        }
        let source = "function solve() { return 'named'; }\nmodule.exports = () => 'exported';";
        let result = engine()
            .execute(source, &json!([{"input": [], "expectedOutput": "named"}]))
            .await;

        assert_eq!(result.test_cases_passed, 1);
    }

    #[tokio::test]
    async fn test_structured_and_float_outputs() {
        if !node_available() {
            return;
        }
        let source = r#"
            function solve(kind) {
                if (kind === "float") return 0.1 + 0.2;
                if (kind === "obj") return { b: [1, 2], a: null };
                return [3, 2, 1];
            }
        "#;
        let result = engine()
            .execute(
                source,
                &json!([
                    {"input": "float", "expectedOutput": 0.3},
                    {"input": ["obj"], "expectedOutput": {"a": null, "b": [1, 2]}},
                    {"input": ["arr"], "expectedOutput": [1, 2, 3]},
                ]),
            )
            .await;

        assert_eq!(result.test_cases_passed, 2);
        assert_eq!(result.execution_score, 7);
    }

    #[tokio::test]
    async fn test_throw_stops_remaining_cases() {
        if !node_available() {
            return;
        }
        let source = "function solve(n) { if (n === 2) throw new Error('bad input'); return n; }";
        let result = engine()
            .execute(
                source,
                &json!([
                    {"input": [1], "expectedOutput": 1, "description": "one"},
                    {"input": [2], "expectedOutput": 2, "description": "two"},
                    {"input": [3], "expectedOutput": 3, "description": "three"},
                ]),
            )
            .await;

        assert_eq!(result.test_cases_passed, 1);
        assert_eq!(result.total_test_cases, 3);
        assert!(result.execution_score <= 3);
        let message = result.runtime_error.unwrap();
        assert!(message.contains("\"two\""));
        assert!(message.contains("bad input"));
    }

    #[tokio::test]
    async fn test_no_host_capabilities() {
        if !node_available() {
            return;
        }
        let source = "function solve() { return require('fs').readFileSync('/etc/passwd', 'utf8'); }";
        let result = engine().execute(source, &json!([])).await;

        assert_eq!(result.test_cases_passed, 0);
        assert!(result.runtime_error.unwrap().contains("require"));

        let source = "function solve() { return typeof process; }";
        let result = engine()
            .execute(source, &json!([{"input": [], "expectedOutput": "undefined"}]))
            .await;
        assert_eq!(result.test_cases_passed, 1);
    }

    #[tokio::test]
    async fn test_console_output_is_ignored() {
        if !node_available() {
            return;
        }
        let source = "console.log('loaded'); function solve(x) { console.log(x); return x; }";
        let result = engine()
            .execute(source, &json!([{"input": [7], "expectedOutput": 7}]))
            .await;

        assert_eq!(result.execution_score, 10);
    }

    #[tokio::test]
    async fn test_async_entry_point() {
        if !node_available() {
            return;
        }
        let source = "async function solve(a) { return a * 2; }";
        let result = engine()
            .execute(source, &json!([{"input": [21], "expectedOutput": 42}]))
            .await;

        assert_eq!(result.test_cases_passed, 1);
    }

    #[tokio::test]
    async fn test_top_level_infinite_loop_times_out() {
        if !node_available() {
            return;
        }
        let result = engine()
            .execute("while (true) {}", &json!([{"input": [], "expectedOutput": 1}]))
            .await;

        assert_eq!(result.test_cases_passed, 0);
        assert_eq!(result.execution_score, 0);
        assert!(result.runtime_error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_case_infinite_loop_is_runtime_fault() {
        if !node_available() {
            return;
        }
        let source = "function solve(n) { if (n > 1) { while (true) {} } return n; }";
        let result = engine()
            .execute(
                source,
                &json!([
                    {"input": [1], "expectedOutput": 1, "description": "fast"},
                    {"input": [2], "expectedOutput": 2, "description": "spins"},
                ]),
            )
            .await;

        assert_eq!(result.test_cases_passed, 1);
        assert_eq!(result.execution_score, 3);
        assert!(result.runtime_error.unwrap().contains("spins"));
    }

    #[tokio::test]
    async fn test_async_case_infinite_loop_is_runtime_fault() {
        if !node_available() {
            return;
        }
        let source = "async function solve(n) { if (n === 2) { await null; while (true) {} } return n; }";
        let started = std::time::Instant::now();
        let result = engine()
            .execute(
                source,
                &json!([
                    {"input": [1], "expectedOutput": 1, "description": "fast"},
                    {"input": [2], "expectedOutput": 2, "description": "spins-async"},
                ]),
            )
            .await;

        assert_eq!(result.test_cases_passed, 1);
        assert_eq!(result.total_test_cases, 2);
        assert_eq!(result.execution_score, 3);
        assert!(result.runtime_error.unwrap().contains("spins-async"));
        assert!(started.elapsed() < std::time::Duration::from_millis(6_000));
    }

    #[tokio::test]
    async fn test_spinning_serialization_is_runtime_fault() {
        if !node_available() {
            return;
        }
        let source = r#"
            function solve(n) {
                if (n === 2) return { toJSON() { while (true) {} } };
                if (n === 3) return { get then() { while (true) {} } };
                return n;
            }
        "#;
        for (input, description) in [(2, "bad-json"), (3, "bad-then")] {
            let result = engine()
                .execute(
                    source,
                    &json!([
                        {"input": [1], "expectedOutput": 1, "description": "fine"},
                        {"input": [input], "expectedOutput": input, "description": description},
                    ]),
                )
                .await;

            assert_eq!(result.test_cases_passed, 1, "case: {}", description);
            assert_eq!(result.execution_score, 3);
            assert!(result.runtime_error.unwrap().contains(description));
        }
    }

    #[tokio::test]
    async fn test_unsettled_promise_is_runtime_fault() {
        if !node_available() {
            return;
        }
        let source = "function solve() { return new Promise(() => {}); }";
        let result = engine()
            .execute(source, &json!([{"input": [], "expectedOutput": 1, "description": "never"}]))
            .await;

        assert_eq!(result.test_cases_passed, 0);
        let message = result.runtime_error.unwrap();
        assert!(message.contains("never"));
        assert!(message.contains("did not settle"));
    }

    #[tokio::test]
    async fn test_missing_entry_point_and_syntax_error() {
        if !node_available() {
            return;
        }
        let result = engine().execute("const answerValue = 42;", &json!([])).await;
        assert_eq!(result.execution_score, 0);
        assert!(result.runtime_error.unwrap().contains("No callable entry point"));

        let result = engine().execute("function solve( {", &json!([])).await;
        assert_eq!(result.execution_score, 0);
        assert!(result.runtime_error.unwrap().contains("SyntaxError"));
    }
}
