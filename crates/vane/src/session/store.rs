//! Session Registry
//!
//! DashMap-backed registry of open sessions. Insert and remove are the only
//! cross-session operations; queue pushes go straight to the session's own
//! channel.

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{EventSender, Session, WorkQueue};
use crate::types::invocation::InvocationRequest;

/// Reasons an invocation cannot be queued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    #[error("session not found: {0}")]
    UnknownSession(String),
}

/// Statistics about registered sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Total number of sessions.
    pub total: usize,
    /// Sessions whose stream is still being read.
    pub connected: usize,
}

/// Registry of open sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session bound to `transport`.
    ///
    /// Returns the generated session ID and the queue the session task must
    /// drain.
    pub fn open(&self, transport: EventSender) -> (String, WorkQueue) {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();

        self.sessions
            .insert(id.clone(), Session::new(id.clone(), tx, transport));

        tracing::info!(session_id = %id, total = self.sessions.len(), "Session opened");
        (id, rx)
    }

    /// Append a request to its session's queue.
    ///
    /// A session whose task already exited is removed and reported unknown.
    pub fn enqueue(&self, request: InvocationRequest) -> Result<(), EnqueueError> {
        let session_id = request.session_id.clone();

        let rejected = match self.sessions.get(&session_id) {
            None => return Err(EnqueueError::UnknownSession(session_id)),
            Some(session) => session.queue.send(request).is_err(),
        };

        if rejected {
            self.remove(&session_id);
            return Err(EnqueueError::UnknownSession(session_id));
        }

        Ok(())
    }

    /// Check whether a session is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Remove a session, dropping its queue sender.
    pub fn remove(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                tracing::info!(
                    session_id = %id,
                    age_secs = session.age().as_secs(),
                    "Session closed"
                );
                true
            }
            None => false,
        }
    }

    /// Remove every session. Their tasks observe the closed queue and exit.
    pub fn close_all(&self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        if count > 0 {
            tracing::info!(closed = count, "Closed all sessions");
        }
        count
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Get session statistics.
    pub fn stats(&self) -> SessionStats {
        let connected = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_connected())
            .count();

        SessionStats {
            total: self.sessions.len(),
            connected,
        }
    }
}
