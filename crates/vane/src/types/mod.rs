//! Wire Types
//!
//! Everything that crosses the stream or the message endpoint.

pub mod content;
pub mod error;
pub mod event;
pub mod invocation;
pub mod tool;

pub use content::Content;
pub use error::{ErrorCode, ToolError};
pub use event::{Handshake, HANDSHAKE_EVENT, RESULT_EVENT};
pub use invocation::{CorrelationId, InvocationRequest, InvocationResult, Outcome, ToolOutput};
pub use tool::{ToolDescriptor, ToolSchema};
