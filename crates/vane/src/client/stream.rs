//! SSE stream client.

use futures::StreamExt;
use reqwest::Client;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use super::decoder::{SseDecoder, SseFrame};
use super::{ClientError, ClientOptions};
use crate::types::event::{Handshake, HANDSHAKE_EVENT, RESULT_EVENT};
use crate::types::invocation::{CorrelationId, InvocationRequest, InvocationResult, ToolOutput};
use crate::types::tool::ToolDescriptor;

type PendingMap = Arc<Mutex<HashMap<CorrelationId, oneshot::Sender<InvocationResult>>>>;

/// Client holding one open stream and its session.
///
/// Dropping the client closes the stream.
pub struct StreamClient {
    base_url: String,
    http: Client,
    session_id: String,
    tools: Vec<ToolDescriptor>,
    pending: PendingMap,
    next_id: AtomicI64,
    closed: CancellationToken,
    listener: JoinHandle<()>,
    options: ClientOptions,
}

impl StreamClient {
    /// Open the stream and wait for the handshake.
    pub async fn connect(base_url: &str, options: ClientOptions) -> Result<Self, ClientError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = Client::new();
        let stream_url = format!("{}{}", base_url, options.stream_path);

        let response = timeout(
            options.handshake_timeout,
            http.get(&stream_url)
                .header("Accept", "text/event-stream")
                .send(),
        )
        .await
        .map_err(|_| ClientError::Timeout("stream connection".into()))??;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = CancellationToken::new();
        let (handshake_tx, handshake_rx) = oneshot::channel();

        let listener = tokio::spawn(listen(
            response.bytes_stream(),
            Arc::clone(&pending),
            handshake_tx,
            closed.clone(),
        ));

        let handshake = match timeout(options.handshake_timeout, handshake_rx).await {
            Ok(Ok(handshake)) => handshake,
            Ok(Err(_)) => {
                listener.abort();
                return Err(ClientError::Protocol("Stream closed before handshake".into()));
            }
            Err(_) => {
                listener.abort();
                return Err(ClientError::Timeout("handshake".into()));
            }
        };

        tracing::info!(
            session_id = %handshake.session_id,
            tools = handshake.tools.len(),
            "Connected to tool server"
        );

        Ok(Self {
            base_url,
            http,
            session_id: handshake.session_id,
            tools: handshake.tools,
            pending,
            next_id: AtomicI64::new(1),
            closed,
            listener,
            options,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session ID from the handshake.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Tools advertised in the handshake.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Check whether the stream has ended.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Call a tool and wait for its result on the stream.
    ///
    /// A failure-tagged result comes back as `ClientError::Tool`.
    #[tracing::instrument(skip(self, arguments), fields(session_id = %self.session_id))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolOutput, ClientError> {
        let result = self.invoke(name, arguments).await?;
        result.into_result().map_err(|error| ClientError::Tool {
            name: name.to_string(),
            error,
        })
    }

    /// Submit an invocation and return the raw result event.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<InvocationResult, ClientError> {
        if self.is_closed() {
            return Err(ClientError::StreamClosed);
        }

        let correlation_id = CorrelationId::Number(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            // The listener clears the map after cancelling; don't outlive it.
            if self.is_closed() {
                return Err(ClientError::StreamClosed);
            }
            pending.insert(correlation_id.clone(), tx);
        }

        let request = InvocationRequest::new(
            self.session_id.clone(),
            correlation_id.clone(),
            name,
            arguments,
        );

        if let Err(e) = self.post(&request).await {
            self.pending.lock().await.remove(&correlation_id);
            return Err(e);
        }

        tracing::debug!(correlation_id = %correlation_id, tool.name = %name, "Invocation accepted");

        match timeout(self.options.call_timeout, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(ClientError::StreamClosed),
            Err(_) => {
                self.pending.lock().await.remove(&correlation_id);
                Err(ClientError::Timeout(format!("result of {}", name)))
            }
        }
    }

    async fn post(&self, request: &InvocationRequest) -> Result<(), ClientError> {
        let url = format!("{}{}", self.base_url, self.options.message_path);
        let response = self.http.post(&url).json(request).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("base_url", &self.base_url)
            .field("session_id", &self.session_id)
            .field("tools", &self.tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Background task: decode the stream, deliver the handshake once, then route
/// results to waiting callers by correlation ID.
async fn listen(
    mut stream: impl futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin,
    pending: PendingMap,
    handshake_tx: oneshot::Sender<Handshake>,
    closed: CancellationToken,
) {
    let mut decoder = SseDecoder::new();
    let mut handshake_tx = Some(handshake_tx);

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(error = %e, "Stream read failed");
                break;
            }
        };

        for frame in decoder.push(&chunk) {
            handle_frame(frame, &pending, &mut handshake_tx).await;
        }
    }

    closed.cancel();
    // Dropping the senders wakes every waiter with StreamClosed
    pending.lock().await.clear();
    tracing::info!("Tool server stream ended");
}

async fn handle_frame(
    frame: SseFrame,
    pending: &PendingMap,
    handshake_tx: &mut Option<oneshot::Sender<Handshake>>,
) {
    match frame.event.as_str() {
        HANDSHAKE_EVENT => match serde_json::from_str::<Handshake>(&frame.data) {
            Ok(handshake) => match handshake_tx.take() {
                Some(tx) => {
                    let _ = tx.send(handshake);
                }
                None => tracing::warn!("Ignoring repeated handshake"),
            },
            Err(e) => tracing::warn!(error = %e, "Malformed handshake"),
        },
        RESULT_EVENT => match serde_json::from_str::<InvocationResult>(&frame.data) {
            Ok(result) => {
                let waiter = pending.lock().await.remove(&result.correlation_id);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(result);
                    }
                    None => tracing::warn!(
                        correlation_id = %result.correlation_id,
                        "Result for unknown correlation ID"
                    ),
                }
            }
            Err(e) => tracing::warn!(error = %e, "Malformed result"),
        },
        other => tracing::debug!(event = %other, "Ignoring event"),
    }
}
