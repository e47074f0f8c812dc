use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Challenge {
    pub name: String,
    pub description: String,
    pub starter_code: String,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestCase {
    pub function: String,
    pub description: String,
    pub input: Value,
    pub expected: Value,
}

impl TestCase {
    /// Mapping inputs bind to parameters by name; anything else is passed as
    /// the only positional argument.
    pub fn is_keyword_call(&self) -> bool {
        self.input.is_object()
    }
}
