//! Invocation Types
//!
//! The request posted to the message endpoint and the result streamed back.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::content::Content;
use super::error::ToolError;

/// Correlation ID - can be a string or integer. Echoed verbatim.
///
/// Numbers must fit in an `i64`. Fractional values and integers above
/// `i64::MAX` don't match either variant, so a request carrying one is
/// rejected as malformed (400). Send those as strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum CorrelationId {
    Number(i64),
    String(String),
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrelationId::Number(n) => write!(f, "{}", n),
            CorrelationId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for CorrelationId {
    fn from(n: i64) -> Self {
        CorrelationId::Number(n)
    }
}

impl From<String> for CorrelationId {
    fn from(s: String) -> Self {
        CorrelationId::String(s)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        CorrelationId::String(s.to_string())
    }
}

/// A tool call submitted against an open session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Session the result should be streamed to.
    pub session_id: String,

    /// Caller token echoed on the result.
    pub correlation_id: CorrelationId,

    /// Tool to run.
    pub tool_name: String,

    /// Tool arguments. Missing or `null` means no arguments.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub arguments: Map<String, Value>,
}

impl InvocationRequest {
    pub fn new(
        session_id: impl Into<String>,
        correlation_id: impl Into<CorrelationId>,
        tool_name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            correlation_id: correlation_id.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Map<String, Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Successful tool output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<Content>,
}

impl ToolOutput {
    pub fn new(content: Vec<Content>) -> Self {
        Self { content }
    }

    /// Single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![Content::text(text)])
    }

    /// Concatenated text of all text blocks.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(Content::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Either half of an invocation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Result(ToolOutput),
    Error(ToolError),
}

/// A result event: `{correlation_id, result}` or `{correlation_id, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub correlation_id: CorrelationId,

    #[serde(flatten)]
    pub outcome: Outcome,
}

impl InvocationResult {
    pub fn success(correlation_id: CorrelationId, output: ToolOutput) -> Self {
        Self {
            correlation_id,
            outcome: Outcome::Result(output),
        }
    }

    pub fn failure(correlation_id: CorrelationId, error: ToolError) -> Self {
        Self {
            correlation_id,
            outcome: Outcome::Error(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<ToolOutput, ToolError> {
        match self.outcome {
            Outcome::Result(output) => Ok(output),
            Outcome::Error(error) => Err(error),
        }
    }
}
