//! Tool Error Types
//!
//! Typed failures a tool call can produce. These travel over the stream as
//! the `error` half of an invocation result; they never close a session.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No tool with that name is registered.
    UnknownTool,
    /// Arguments did not match the tool's schema.
    InvalidArguments,
    /// The tool ran and failed.
    ExecutionFailed,
    /// The tool exceeded the configured execution timeout.
    Timeout,
    /// The tool panicked.
    Panicked,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnknownTool => "unknown_tool",
            ErrorCode::InvalidArguments => "invalid_arguments",
            ErrorCode::ExecutionFailed => "execution_failed",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Panicked => "panicked",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct ToolError {
    /// The failure category.
    pub code: ErrorCode,

    /// Human-readable description.
    pub message: String,
}

impl ToolError {
    /// Create a new error with code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create an unknown tool error.
    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorCode::UnknownTool, format!("Unknown tool: {}", name))
    }

    /// Create an invalid arguments error.
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArguments, message)
    }

    /// Create an execution failure.
    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecutionFailed, message)
    }

    /// Create a timeout error.
    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("Tool did not finish within {:?}", limit),
        )
    }

    /// Create a panic error.
    pub fn panicked(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Panicked, message)
    }
}
