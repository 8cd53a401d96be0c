//! Message Handler
//!
//! Handles POST `<message_path>`: parse, validate the session, enqueue.
//! The tool result is delivered on the stream, never in this response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::VaneState;
use crate::session::EnqueueError;
use crate::types::invocation::InvocationRequest;

/// Submit a raw message body.
///
/// - 400 if the body is not an invocation request
/// - 404 if the session is unknown or closed
/// - 202 with an empty body once queued
pub fn submit_message<H>(state: &VaneState<H>, body: &[u8]) -> Response {
    let request: InvocationRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed invocation request");
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid invocation request: {}", e),
            )
                .into_response();
        }
    };

    let session_id = request.session_id.clone();
    let correlation_id = request.correlation_id.clone();
    let tool_name = request.tool_name.clone();

    match state.sessions.enqueue(request) {
        Ok(()) => {
            tracing::info!(
                session_id = %session_id,
                correlation_id = %correlation_id,
                tool.name = %tool_name,
                "Invocation queued"
            );
            StatusCode::ACCEPTED.into_response()
        }
        Err(EnqueueError::UnknownSession(id)) => {
            tracing::warn!(session_id = %id, correlation_id = %correlation_id, "Session not found");
            (StatusCode::NOT_FOUND, "Session not found").into_response()
        }
    }
}
