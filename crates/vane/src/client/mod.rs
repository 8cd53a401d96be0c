//! Stream client for vane servers.
//!
//! Opens the SSE stream, learns the session from the handshake, and posts
//! invocations to the message endpoint. Results are matched back to callers
//! by correlation ID, in whatever order they arrive.
//!
//! # Example
//!
//! ```rust,ignore
//! use vane::client::{ClientOptions, StreamClient};
//!
//! let client = StreamClient::connect("http://localhost:8000", ClientOptions::default()).await?;
//! for tool in client.tools() {
//!     println!("{}: {}", tool.name, tool.description);
//! }
//! let output = client.call_tool("get_historical_weather", args).await?;
//! ```

mod decoder;
mod stream;

pub use decoder::{SseDecoder, SseFrame};
pub use stream::StreamClient;

use std::time::Duration;

use crate::transport::{DEFAULT_MESSAGE_PATH, DEFAULT_STREAM_PATH};
use crate::types::error::ToolError;

/// Options for configuring the stream client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Path of the stream endpoint on the server.
    pub stream_path: String,
    /// Path of the message endpoint on the server.
    pub message_path: String,
    /// How long to wait for the handshake after connecting.
    pub handshake_timeout: Duration,
    /// How long to wait for a tool result.
    pub call_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            message_path: DEFAULT_MESSAGE_PATH.to_string(),
            handshake_timeout: Duration::from_secs(10),
            call_timeout: Duration::from_secs(120),
        }
    }
}

/// Errors that can occur when using the stream client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Timeout waiting for {0}")]
    Timeout(String),

    #[error("Stream closed")]
    StreamClosed,

    #[error("Tool '{name}' failed: {error}")]
    Tool { name: String, error: ToolError },
}
