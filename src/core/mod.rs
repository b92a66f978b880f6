//! Core data model shared by the execution and trust components

pub mod error;
pub mod result;
pub mod testcase;

pub use error::EvaluationError;
pub use result::{ExecutionResult, MAX_EXECUTION_SCORE, RUNTIME_ERROR_SCORE_CAP};
pub use testcase::{normalize_test_cases, TestCase};
