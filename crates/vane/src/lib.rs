//! vane - dual-endpoint SSE tool dispatcher
//!
//! A server exposes tools over two fixed HTTP paths:
//!
//! - `GET /sse` opens a Server-Sent-Events stream. The first event is a
//!   `handshake` carrying the session ID and the tool list; every later event
//!   is a `result` for a previously submitted invocation.
//! - `POST /messages` submits `{session_id, correlation_id, tool_name,
//!   arguments}`. The response is `202 Accepted`; the result arrives on the
//!   stream, tagged with the correlation ID.
//!
//! Paths are matched exactly. Nothing is redirected or normalized.
//!
//! # Server Example
//!
//! ```rust,ignore
//! use vane::{ToolHandler, ToolDescriptor, ToolOutput, ToolError};
//! use async_trait::async_trait;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl ToolHandler for Hello {
//!     fn tools(&self) -> Vec<ToolDescriptor> {
//!         vec![ToolDescriptor::new("hello", "Say hello")]
//!     }
//!
//!     async fn call_tool(&self, _name: &str, _args: serde_json::Map<String, serde_json::Value>)
//!         -> Result<ToolOutput, ToolError>
//!     {
//!         Ok(ToolOutput::text("Hello!"))
//!     }
//! }
//!
//! let state = std::sync::Arc::new(vane::VaneState::new(Hello));
//! let router = vane::router(state);
//! ```
//!
//! # Client Example (requires `client` feature)
//!
//! ```rust,ignore
//! use vane::client::{StreamClient, ClientOptions};
//!
//! let client = StreamClient::connect("http://localhost:8000", ClientOptions::default()).await?;
//! let output = client.call_tool("hello", serde_json::Map::new()).await?;
//! ```

pub mod protocol;
pub mod schema;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(feature = "client")]
pub mod client;

// Re-export commonly used types at crate root
pub use types::content::Content;
pub use types::error::{ErrorCode, ToolError};
pub use types::event::Handshake;
pub use types::invocation::{CorrelationId, InvocationRequest, InvocationResult, Outcome, ToolOutput};
pub use types::tool::{ToolDescriptor, ToolSchema};

pub use protocol::ToolHandler;
pub use schema::schema_for;
pub use session::{SessionRegistry, SessionStats};
pub use transport::{router, TransportOptions, VaneState};
