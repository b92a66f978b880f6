//! Error taxonomy for the evaluation pipeline
//!
//! None of these escape a public evaluation operation as an `Err`. They are
//! rendered through `Display` into the `runtimeError` field of a result.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// No strategy located a callable entry point
    #[error("No callable entry point found (expected one of: {0})")]
    NoEntryPoint(String),

    /// Submitted source failed to evaluate (syntax error, top-level throw)
    #[error("Failed to load submission: {0}")]
    ResolutionFailed(String),

    /// Top-level evaluation or resolution exceeded its budget
    #[error("Execution timed out after {0} ms while loading submission")]
    ResolutionTimeout(u64),

    /// A test invocation threw or timed out
    #[error("Runtime error in \"{description}\": {message}")]
    RuntimeFault { description: String, message: String },

    /// The whole run exceeded its wall-clock budget and was killed
    #[error("Execution timed out after {0} ms")]
    SuiteTimeout(u64),

    /// The runtime process could not be started or returned garbage
    #[error("Execution harness failure: {0}")]
    HarnessProtocol(String),

    /// Simulator absent, failed, or timed out on the caller's side
    #[error("Execution simulator unavailable")]
    CollaboratorUnavailable,
}
