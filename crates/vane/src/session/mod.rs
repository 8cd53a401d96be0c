//! Session Management
//!
//! One session per open stream. The registry is the only state shared across
//! sessions; each session's queue is drained by its own task.

mod store;

pub use store::{EnqueueError, SessionRegistry, SessionStats};

use axum::response::sse::Event;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::types::invocation::InvocationRequest;

/// SSE event sender type alias.
pub type EventSender = mpsc::Sender<Event>;

/// Receiving half of a session's pending-work queue.
pub type WorkQueue = mpsc::UnboundedReceiver<InvocationRequest>;

/// A registered session.
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,

    /// When the stream was opened.
    pub created_at: Instant,

    queue: mpsc::UnboundedSender<InvocationRequest>,

    transport: EventSender,
}

impl Session {
    fn new(id: String, queue: mpsc::UnboundedSender<InvocationRequest>, transport: EventSender) -> Self {
        Self {
            id,
            created_at: Instant::now(),
            queue,
            transport,
        }
    }

    /// Check if the SSE stream is still being read.
    pub fn is_connected(&self) -> bool {
        !self.transport.is_closed()
    }

    /// Time since the stream opened.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
