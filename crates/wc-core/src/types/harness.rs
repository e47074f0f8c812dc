use crate::types::challenge::TestCase;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub const CHALLENGE_NOT_FOUND: &str = "Challenge not found";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestResult {
    pub passed: bool,
    pub description: String,
    pub input: Value,
    pub expected: Value,
    pub actual: Option<Value>,
    pub error: Option<String>,
}

impl TestResult {
    pub fn evaluated(case: &TestCase, actual: Value) -> Self {
        Self {
            passed: values_equal(&actual, &case.expected),
            description: case.description.clone(),
            input: case.input.clone(),
            expected: case.expected.clone(),
            actual: Some(actual),
            error: None,
        }
    }

    pub fn errored(case: &TestCase, message: String) -> Self {
        Self {
            passed: false,
            description: case.description.clone(),
            input: case.input.clone(),
            expected: case.expected.clone(),
            actual: None,
            error: Some(message),
        }
    }
}

/// Outcome of one harness run. Serializes to exactly one of
/// `{all_passed, test_results}`, `{error}` or `{error, trace}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum HarnessResult {
    Completed {
        all_passed: bool,
        test_results: Vec<TestResult>,
    },
    Failed {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trace: Option<String>,
    },
}

impl HarnessResult {
    pub fn from_results(test_results: Vec<TestResult>) -> Self {
        let all_passed = test_results.iter().all(|result| result.passed);
        Self::Completed {
            all_passed,
            test_results,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Failed {
            error: message.into(),
            trace: None,
        }
    }

    pub fn error_with_trace(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self::Failed {
            error: message.into(),
            trace: Some(trace.into()),
        }
    }

    pub fn challenge_not_found() -> Self {
        Self::error(CHALLENGE_NOT_FOUND)
    }

    pub fn all_passed(&self) -> bool {
        matches!(self, Self::Completed { all_passed: true, .. })
    }

    pub fn test_results(&self) -> &[TestResult] {
        match self {
            Self::Completed { test_results, .. } => test_results,
            Self::Failed { .. } => &[],
        }
    }
}

/// Structural equality where numbers compare by value, so `3` equals `3.0`.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                return a == b;
            }
            if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                return a == b;
            }
            match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}
