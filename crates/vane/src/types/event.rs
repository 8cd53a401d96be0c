//! Stream Events
//!
//! SSE event names and the handshake payload.

use serde::{Deserialize, Serialize};

use super::tool::ToolDescriptor;

/// Event name of the first event on every stream.
pub const HANDSHAKE_EVENT: &str = "handshake";

/// Event name of every invocation result.
pub const RESULT_EVENT: &str = "result";

/// First event on a new stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handshake {
    /// Session ID to quote on the message endpoint.
    pub session_id: String,

    /// Tools this server exposes.
    pub tools: Vec<ToolDescriptor>,
}
