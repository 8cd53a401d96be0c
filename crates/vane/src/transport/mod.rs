//! HTTP Transport
//!
//! Two endpoints on fixed paths, never redirected:
//! - GET `<stream_path>` - open an SSE stream, receive handshake and results
//! - POST `<message_path>` - submit an invocation against an open session
//!
//! Every request goes through a single fallback handler that compares the raw
//! path byte-for-byte. No route table, no trailing-slash handling.

mod dispatch;
mod message;
mod sse;

pub use dispatch::{dispatch, route, Route};
pub use message::submit_message;
pub use sse::open_stream;

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::session::SessionRegistry;
use crate::types::tool::ToolDescriptor;
use crate::ToolHandler;

/// Default stream-open path.
pub const DEFAULT_STREAM_PATH: &str = "/sse";

/// Default message-submission path.
pub const DEFAULT_MESSAGE_PATH: &str = "/messages";

/// Transport tuning.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Exact path of the stream endpoint.
    pub stream_path: String,

    /// Exact path of the message endpoint.
    pub message_path: String,

    /// Additional exact paths accepted for message submission.
    pub message_aliases: Vec<String>,

    /// Interval between SSE keep-alive comments.
    pub keep_alive: Duration,

    /// Upper bound on a single tool call. `None` means unbounded.
    pub tool_timeout: Option<Duration>,

    /// Outbound SSE events buffered per session before writes wait.
    pub event_buffer: usize,

    /// Largest accepted message body.
    pub max_body_bytes: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            message_path: DEFAULT_MESSAGE_PATH.to_string(),
            message_aliases: vec!["/sse/messages".to_string()],
            keep_alive: Duration::from_secs(15),
            tool_timeout: None,
            event_buffer: 32,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl TransportOptions {
    /// Check whether `path` is the message endpoint or one of its aliases.
    pub fn is_message_path(&self, path: &str) -> bool {
        path == self.message_path || self.message_aliases.iter().any(|alias| alias == path)
    }
}

/// Shared state for the dispatcher.
pub struct VaneState<H> {
    /// The application's tool handler.
    pub handler: Arc<H>,

    /// Open sessions.
    pub sessions: Arc<SessionRegistry>,

    /// Tool descriptors, frozen at construction.
    pub tools: Arc<[ToolDescriptor]>,

    /// Transport tuning.
    pub options: TransportOptions,

    /// Cancelled on server shutdown.
    pub shutdown: CancellationToken,
}

impl<H: ToolHandler> VaneState<H> {
    /// Create new state with default transport options.
    pub fn new(handler: H) -> Self {
        Self::with_options(handler, TransportOptions::default())
    }

    /// Create new state with the given transport options.
    pub fn with_options(handler: H, options: TransportOptions) -> Self {
        let tools: Arc<[ToolDescriptor]> = handler.tools().into();
        Self {
            handler: Arc::new(handler),
            sessions: Arc::new(SessionRegistry::new()),
            tools,
            options,
            shutdown: CancellationToken::new(),
        }
    }

    /// Close every session and stop accepting work on them.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.sessions.close_all();
    }
}

/// Build the axum Router for the dual-endpoint transport.
pub fn router<H: ToolHandler>(state: Arc<VaneState<H>>) -> Router {
    Router::new()
        .fallback(dispatch::<H>)
        .with_state(state)
}
