//! Harness protocol
//!
//! The engine talks to `harness.js` through one JSON request on stdin and one
//! sentinel-prefixed JSON line on stdout. Anything else the runtime prints is
//! ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entry_point::{EntryPointStrategy, StrategySpec};
use crate::config::ExecutionConfig;
use crate::core::TestCase;

/// Harness script shipped with the engine
pub const HARNESS_SOURCE: &str = include_str!("harness.js");

/// File name the harness is written to inside the run directory
pub const HARNESS_FILE: &str = "harness.js";

/// Prefix of the response line
pub const RESPONSE_SENTINEL: &str = "__EVALUATOR_RESULT__";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessRequest<'a> {
    pub source: &'a str,
    pub strategies: Vec<StrategySpec>,
    /// Positional arguments for each case, in execution order
    pub cases: Vec<&'a [Value]>,
    pub resolution_timeout_ms: u64,
    pub case_timeout_ms: u64,
}

impl<'a> HarnessRequest<'a> {
    pub fn new(
        source: &'a str,
        strategies: &[EntryPointStrategy],
        cases: &'a [TestCase],
        config: &ExecutionConfig,
    ) -> Self {
        Self {
            source,
            strategies: strategies.iter().map(StrategySpec::from).collect(),
            cases: cases.iter().map(|case| case.input.as_slice()).collect(),
            resolution_timeout_ms: config.resolution_timeout_ms,
            case_timeout_ms: config.case_timeout_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HarnessResponse {
    #[serde(rename_all = "camelCase")]
    Completed {
        entry_point: String,
        outcomes: Vec<CaseOutcome>,
    },
    NoEntryPoint,
    ResolutionError {
        message: String,
    },
    ResolutionTimeout,
}

/// Result of invoking the entry point for one case
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CaseOutcome {
    Returned {
        /// `false` when the entry point returned `undefined`
        defined: bool,
        #[serde(default)]
        value: Value,
    },
    Threw {
        message: String,
    },
}

impl CaseOutcome {
    /// Returned value, or `None` for `undefined`
    pub fn actual(&self) -> Option<&Value> {
        match self {
            CaseOutcome::Returned { defined: true, value } => Some(value),
            _ => None,
        }
    }
}

/// Extract the response from the runtime's stdout
pub fn parse_response(stdout: &str) -> Result<HarnessResponse, String> {
    let line = stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(RESPONSE_SENTINEL))
        .ok_or_else(|| "runtime produced no result".to_string())?;

    serde_json::from_str(line).map_err(|e| format!("malformed harness response: {}", e))
}
