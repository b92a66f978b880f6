//! Test case model and normalization
//!
//! Test cases arrive from the question store as loosely shaped JSON. They are
//! normalized once, up front, so the engine only ever sees well-formed cases.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description given to cases that do not carry one
pub const DEFAULT_DESCRIPTION: &str = "Generated test";

/// Description of the synthetic case substituted for an empty suite
pub const SMOKE_TEST_DESCRIPTION: &str = "Smoke test";

/// A single well-formed test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Positional arguments passed to the entry point
    pub input: Vec<Value>,
    /// Expected result. `None` means any defined result passes;
    /// `Some(Value::Null)` expects a literal `null`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub expected_output: Option<Value>,
    pub description: String,
}

impl TestCase {
    #[cfg(test)]
    pub fn new(input: Vec<Value>, expected_output: Option<Value>) -> Self {
        Self {
            input,
            expected_output,
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Case run when a submission has no usable test cases
    pub fn smoke_test() -> Self {
        Self {
            input: Vec::new(),
            expected_output: None,
            description: SMOKE_TEST_DESCRIPTION.to_string(),
        }
    }
}

/// Keeps an explicit `null` as `Some(Value::Null)`; a missing key falls back
/// to `None` through `#[serde(default)]`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Normalize a raw, possibly malformed test case list.
///
/// Anything that is not an array yields an empty list. Entries that are not
/// objects or lack an `input` key are dropped. A scalar `input` is wrapped
/// into a single-element argument list.
pub fn normalize_test_cases(raw: &Value) -> Vec<TestCase> {
    let Some(entries) = raw.as_array() else {
        return Vec::new();
    };

    entries.iter().filter_map(normalize_entry).collect()
}

fn normalize_entry(entry: &Value) -> Option<TestCase> {
    let fields = entry.as_object()?;
    let input = fields.get("input")?;

    let input = match input {
        Value::Array(items) => items.clone(),
        scalar => vec![scalar.clone()],
    };

    let expected_output = fields
        .get("expectedOutput")
        .or_else(|| fields.get("expected_output"))
        .cloned();

    let description = fields
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    Some(TestCase {
        input,
        expected_output,
        description,
    })
}
