//! SSE Handler
//!
//! Handles GET `<stream_path>`: registers a session, emits the handshake and
//! spawns the task that drains the session's queue into the stream.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::Instrument;

use super::VaneState;
use crate::session::{EventSender, WorkQueue};
use crate::types::event::{Handshake, HANDSHAKE_EVENT, RESULT_EVENT};
use crate::ToolHandler;

/// Open a stream and start its session task.
pub async fn open_stream<H: ToolHandler>(
    state: Arc<VaneState<H>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Event>(state.options.event_buffer.max(1));

    let (session_id, queue) = state.sessions.open(tx.clone());

    let handshake = Handshake {
        session_id: session_id.clone(),
        tools: state.tools.to_vec(),
    };

    match encode(HANDSHAKE_EVENT, &handshake) {
        Ok(event) => {
            if tx.send(event).await.is_err() {
                tracing::warn!(session_id = %session_id, "Failed to send handshake");
            }
        }
        Err(e) => tracing::error!(session_id = %session_id, error = %e, "Failed to encode handshake"),
    }

    let span = tracing::info_span!("gateway.session", session_id = %session_id);
    tokio::spawn(run_session(Arc::clone(&state), session_id, queue, tx).instrument(span));

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(state.options.keep_alive)
            .text("ping"),
    )
}

/// Drain one session's queue in FIFO order until the stream closes, the
/// session is removed, or the server shuts down.
pub(crate) async fn run_session<H: ToolHandler>(
    state: Arc<VaneState<H>>,
    session_id: String,
    mut queue: WorkQueue,
    events: EventSender,
) {
    tracing::debug!("Session task started");
    let mut delivered = 0u64;

    loop {
        let request = tokio::select! {
            biased;
            _ = state.shutdown.cancelled() => {
                tracing::debug!("Server shutting down");
                break;
            }
            _ = events.closed() => {
                tracing::info!("Client disconnected");
                break;
            }
            next = queue.recv() => match next {
                Some(request) => request,
                None => {
                    tracing::debug!("Session removed from registry");
                    break;
                }
            },
        };

        let call = crate::protocol::execute(
            state.handler.as_ref(),
            &state.tools,
            &session_id,
            request,
            state.options.tool_timeout,
        );

        // A disconnect mid-call abandons the call.
        let result = tokio::select! {
            biased;
            _ = state.shutdown.cancelled() => break,
            _ = events.closed() => {
                tracing::info!("Client disconnected during tool call");
                break;
            }
            result = call => result,
        };

        let event = match encode(RESULT_EVENT, &result) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(correlation_id = %result.correlation_id, error = %e, "Failed to encode result");
                continue;
            }
        };

        if events.send(event).await.is_err() {
            tracing::info!(correlation_id = %result.correlation_id, "Stream write failed, dropping session");
            break;
        }
        delivered += 1;
    }

    state.sessions.remove(&session_id);
    tracing::debug!(delivered, "Session task finished");
}

fn encode<T: Serialize>(name: &str, payload: &T) -> Result<Event, serde_json::Error> {
    let data = serde_json::to_string(payload)?;
    Ok(Event::default().event(name).data(data))
}
