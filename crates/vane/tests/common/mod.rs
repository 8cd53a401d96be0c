//! Shared fixtures: a small tool set and a server on an ephemeral port.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use vane::{router, ToolDescriptor, ToolError, ToolHandler, ToolOutput, TransportOptions, VaneState};

pub struct TestTools;

#[async_trait]
impl ToolHandler for TestTools {
    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("echo", "Echo the message argument"),
            ToolDescriptor::new("sleep", "Sleep for ms, then reply with the tag"),
            ToolDescriptor::new("fail", "Always fails"),
            ToolDescriptor::new("explode", "Always panics"),
        ]
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        match name {
            "echo" => {
                let message = arguments
                    .get("message")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ToolError::invalid_arguments("message is required"))?;
                Ok(ToolOutput::text(message))
            }
            "sleep" => {
                let ms = arguments.get("ms").and_then(Value::as_u64).unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                let tag = arguments.get("tag").cloned().unwrap_or(Value::Null);
                Ok(ToolOutput::text(tag.to_string()))
            }
            "fail" => Err(ToolError::execution_failed("archive unavailable")),
            "explode" => panic!("kaboom"),
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}

pub struct TestServer {
    pub base_url: String,
    pub state: Arc<VaneState<TestTools>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(TransportOptions::default()).await
    }

    pub async fn start_with(options: TransportOptions) -> Self {
        let state = Arc::new(VaneState::with_options(TestTools, options));
        let app = router(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// One decoded SSE frame.
#[derive(Debug)]
pub struct Frame {
    pub event: String,
    pub data: Value,
}

/// Minimal reader over a live event stream. Skips keep-alive comments.
pub struct EventReader {
    stream: futures::stream::BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    buffer: String,
}

impl EventReader {
    pub async fn open(url: &str) -> Self {
        let response = reqwest::Client::new()
            .get(url)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        Self {
            stream: response.bytes_stream().boxed(),
            buffer: String::new(),
        }
    }

    pub async fn next(&mut self) -> Frame {
        tokio::time::timeout(Duration::from_secs(5), self.next_inner())
            .await
            .expect("timed out waiting for event")
    }

    /// Wait briefly and return a frame only if one arrives.
    pub async fn try_next(&mut self, wait: Duration) -> Option<Frame> {
        tokio::time::timeout(wait, self.next_inner()).await.ok()
    }

    async fn next_inner(&mut self) -> Frame {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(..end + 2).collect();
                let mut event = String::from("message");
                let mut data = Vec::new();
                for line in block.lines() {
                    if let Some(v) = line.strip_prefix("event:") {
                        event = v.trim_start().to_string();
                    } else if let Some(v) = line.strip_prefix("data:") {
                        data.push(v.strip_prefix(' ').unwrap_or(v).to_string());
                    }
                }
                if data.is_empty() {
                    continue;
                }
                return Frame {
                    event,
                    data: serde_json::from_str(&data.join("\n")).unwrap(),
                };
            }

            let chunk = self.stream.next().await.expect("stream ended").unwrap();
            self.buffer
                .push_str(&String::from_utf8_lossy(&chunk).replace("\r\n", "\n"));
        }
    }

    /// Wait for the server to end the stream, discarding anything still
    /// buffered. False if it is still open after `wait`.
    pub async fn ends_within(&mut self, wait: Duration) -> bool {
        let drain = async {
            while let Some(chunk) = self.stream.next().await {
                if chunk.is_err() {
                    break;
                }
            }
        };
        tokio::time::timeout(wait, drain).await.is_ok()
    }

    /// Read the handshake and return the session id.
    pub async fn handshake(&mut self) -> String {
        let frame = self.next().await;
        assert_eq!(frame.event, "handshake");
        frame.data["session_id"].as_str().unwrap().to_string()
    }
}

pub fn invocation(session_id: &str, correlation_id: Value, tool: &str, arguments: Value) -> Value {
    json!({
        "session_id": session_id,
        "correlation_id": correlation_id,
        "tool_name": tool,
        "arguments": arguments,
    })
}

pub async fn post(url: &str, body: &Value) -> reqwest::Response {
    no_redirect_client().post(url).json(body).send().await.unwrap()
}

pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
