//! Output checker
//!
//! Decides whether a value produced by candidate code matches the expected
//! value of a test case. Top-level numbers compare with an absolute tolerance
//! so floating-point noise is not punished. Everything else, including numbers
//! nested inside arrays or objects, must match structurally.

use serde_json::Value;

/// Absolute tolerance for top-level numeric comparison
pub const NUMERIC_TOLERANCE: f64 = 1e-9;

/// Verdict for one test case given its expected and actual values.
///
/// `actual == None` means the entry point returned `undefined`. A case with no
/// expected output passes as long as something was returned.
pub fn check_case(expected: Option<&Value>, actual: Option<&Value>) -> bool {
    match (expected, actual) {
        (None, actual) => actual.is_some(),
        (Some(_), None) => false,
        (Some(expected), Some(actual)) => outputs_match(actual, expected),
    }
}

/// Compare an actual output against the expected one
pub fn outputs_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(e)) => match (a.as_f64(), e.as_f64()) {
            (Some(a), Some(e)) => (a - e).abs() < NUMERIC_TOLERANCE,
            _ => a == e,
        },
        _ => structurally_equal(actual, expected),
    }
}

/// Deep equality: key order never matters for objects, element order always
/// matters for arrays.
fn structurally_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| structurally_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| structurally_equal(x, y)))
        }
        _ => a == b,
    }
}
