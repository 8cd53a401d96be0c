//! Tool Execution
//!
//! The handler seam and the single place a queued invocation turns into a
//! result. Faults of any kind (an `Err`, a panic, an elapsed timeout) come out
//! as failure-tagged results; nothing here can end a session.

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::Instrument;

use crate::types::error::ToolError;
use crate::types::invocation::{InvocationRequest, InvocationResult, ToolOutput};
use crate::types::tool::ToolDescriptor;

/// Handler trait for tool server implementations.
#[async_trait]
pub trait ToolHandler: Send + Sync + 'static {
    /// Return the list of available tools. Read once at startup.
    fn tools(&self) -> Vec<ToolDescriptor>;

    /// Execute a tool call.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolOutput, ToolError>;
}

/// Run one invocation to completion.
///
/// Names missing from `tools` are rejected without calling the handler.
pub async fn execute<H: ToolHandler + ?Sized>(
    handler: &H,
    tools: &[ToolDescriptor],
    session_id: &str,
    request: InvocationRequest,
    timeout: Option<Duration>,
) -> InvocationResult {
    let InvocationRequest {
        correlation_id,
        tool_name,
        arguments,
        ..
    } = request;

    let span = tracing::info_span!(
        "gateway.tool.call",
        tool.name = %tool_name,
        session_id = %session_id,
        correlation_id = %correlation_id,
        error.type = tracing::field::Empty,
    );

    async {
        let outcome = if tools.iter().any(|t| t.name == tool_name) {
            run_guarded(handler, &tool_name, arguments, timeout).await
        } else {
            Err(ToolError::unknown_tool(&tool_name))
        };

        match outcome {
            Ok(output) => {
                tracing::debug!(blocks = output.content.len(), "Tool call succeeded");
                InvocationResult::success(correlation_id.clone(), output)
            }
            Err(error) => {
                tracing::Span::current().record("error.type", error.code.as_str());
                tracing::warn!(error = %error, "Tool call failed");
                InvocationResult::failure(correlation_id.clone(), error)
            }
        }
    }
    .instrument(span)
    .await
}

async fn run_guarded<H: ToolHandler + ?Sized>(
    handler: &H,
    name: &str,
    arguments: Map<String, Value>,
    timeout: Option<Duration>,
) -> Result<ToolOutput, ToolError> {
    let call = AssertUnwindSafe(handler.call_tool(name, arguments)).catch_unwind();

    let caught = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(caught) => caught,
            Err(_) => return Err(ToolError::timeout(limit)),
        },
        None => call.await,
    };

    caught.unwrap_or_else(|panic| Err(ToolError::panicked(panic_message(panic.as_ref()))))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("Tool panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("Tool panicked: {}", s)
    } else {
        "Tool panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::error::ErrorCode;
    use crate::types::invocation::Outcome;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        fn tools(&self) -> Vec<ToolDescriptor> {
            vec![
                ToolDescriptor::new("echo", "Echo arguments"),
                ToolDescriptor::new("explode", "Always panics"),
                ToolDescriptor::new("slow", "Sleeps"),
            ]
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: Map<String, Value>,
        ) -> Result<ToolOutput, ToolError> {
            match name {
                "echo" => Ok(ToolOutput::text(Value::Object(arguments).to_string())),
                "explode" => panic!("kaboom"),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(ToolOutput::text("late"))
                }
                other => Err(ToolError::unknown_tool(other)),
            }
        }
    }

    fn request(tool: &str) -> InvocationRequest {
        InvocationRequest::new("S1", 9, tool, Map::new())
    }

    #[tokio::test]
    async fn test_execute_success() {
        let tools = Echo.tools();
        let result = execute(&Echo, &tools, "S1", request("echo"), None).await;

        assert_eq!(result.correlation_id, 9.into());
        assert_eq!(result.into_result().unwrap().joined_text(), "{}");
    }

    #[tokio::test]
    async fn test_unregistered_tool_never_reaches_handler() {
        let tools = vec![ToolDescriptor::new("echo", "Echo arguments")];
        let result = execute(&Echo, &tools, "S1", request("explode"), None).await;

        match result.outcome {
            Outcome::Error(e) => assert_eq!(e.code, ErrorCode::UnknownTool),
            other => panic!("expected unknown tool, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let tools = Echo.tools();
        let result = execute(&Echo, &tools, "S1", request("explode"), None).await;

        let error = result.into_result().unwrap_err();
        assert_eq!(error.code, ErrorCode::Panicked);
        assert!(error.message.contains("kaboom"));
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure() {
        let tools = Echo.tools();
        let result = execute(
            &Echo,
            &tools,
            "S1",
            request("slow"),
            Some(Duration::from_millis(20)),
        )
        .await;

        assert_eq!(result.into_result().unwrap_err().code, ErrorCode::Timeout);
    }
}
