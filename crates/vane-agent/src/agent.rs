//! The agent loop.
//!
//! Each question runs the model until it stops asking for tools. Tool calls go
//! through the stream client; text results are fed back to the model and
//! images are written to disk. Only user and assistant text survive into the
//! next question.

use async_openai::types::ChatCompletionTool;
use chrono::Local;
use serde_json::{Map, Value};
use std::path::PathBuf;
use vane::client::{ClientError, StreamClient};
use vane::Content;

use crate::error::AgentError;
use crate::images;
use crate::provider::{self, Message, ModelTurn, OpenAiProvider, RequestedCall};

/// What the model is told in place of image bytes.
pub const IMAGE_PLACEHOLDER: &str = "[Image Generated Successfully]";

/// Tool the model is steered toward for charts.
const VISUALIZATION_TOOL: &str = "get_weather_visualization";

/// Final answer for one question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub text: String,
    pub images: Vec<PathBuf>,
    pub tool_calls: usize,
}

/// Output of one tool call, as the model and the user see it.
#[derive(Debug, Default)]
struct ToolReport {
    text: String,
    images: Vec<PathBuf>,
}

pub struct Agent {
    provider: OpenAiProvider,
    client: StreamClient,
    tools: Vec<ChatCompletionTool>,
    max_tool_iterations: usize,
    image_dir: PathBuf,
    history: Vec<Message>,
}

impl Agent {
    pub fn new(
        provider: OpenAiProvider,
        client: StreamClient,
        max_tool_iterations: usize,
        image_dir: PathBuf,
    ) -> Result<Self, AgentError> {
        let tools = provider::convert_tools(client.tools())?;
        Ok(Self {
            provider,
            client,
            tools,
            max_tool_iterations: max_tool_iterations.max(1),
            image_dir,
            history: Vec::new(),
        })
    }

    /// Tool server session this agent is bound to.
    pub fn session_id(&self) -> &str {
        self.client.session_id()
    }

    /// User and assistant turns so far.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Answer one question.
    #[tracing::instrument(skip(self, question), fields(session_id = %self.client.session_id()))]
    pub async fn ask(&mut self, question: &str) -> Result<Reply, AgentError> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(Message::System(system_prompt()));
        messages.extend(self.history.iter().cloned());
        messages.push(Message::User(question.to_string()));

        let mut reply = Reply::default();

        for iteration in 0..self.max_tool_iterations {
            tracing::info!(iteration, "Agent loop iteration");
            let turn: ModelTurn = self.provider.chat(&messages, &self.tools).await?;

            if !turn.wants_tools() {
                reply.text = turn.content.unwrap_or_default();
                self.history.push(Message::User(question.to_string()));
                self.history.push(Message::Assistant {
                    content: Some(reply.text.clone()),
                    tool_calls: Vec::new(),
                });
                return Ok(reply);
            }

            messages.push(Message::Assistant {
                content: turn.content.clone(),
                tool_calls: turn.tool_calls.clone(),
            });

            for call in &turn.tool_calls {
                let report = self.run_tool(call).await?;
                reply.tool_calls += 1;
                reply.images.extend(report.images);
                messages.push(Message::Tool {
                    call_id: call.id.clone(),
                    content: report.text,
                });
            }
        }

        Err(AgentError::TooManyToolRounds(self.max_tool_iterations))
    }

    /// Run one requested call. Tool failures are reported to the model;
    /// a broken stream is not.
    #[tracing::instrument(skip(self, call), fields(tool.name = %call.name, tool.call_id = %call.id))]
    async fn run_tool(&self, call: &RequestedCall) -> Result<ToolReport, AgentError> {
        let arguments = match parse_arguments(&call.arguments) {
            Ok(arguments) => arguments,
            Err(message) => {
                tracing::warn!(%message, "Model sent unusable arguments");
                return Ok(ToolReport {
                    text: format!("Error: {}", message),
                    images: Vec::new(),
                });
            }
        };

        let output = match self.client.call_tool(&call.name, arguments).await {
            Ok(output) => output,
            Err(ClientError::Tool { error, .. }) => {
                tracing::warn!(%error, "Tool failed");
                return Ok(ToolReport {
                    text: format!("Error: {}", error.message),
                    images: Vec::new(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut report = ToolReport::default();
        for (index, block) in output.content.iter().enumerate() {
            match block {
                Content::Text { text } => report.text.push_str(text),
                Content::Image { data, mime_type } => {
                    let stem = format!("{}-{}", call.name, index);
                    let path = images::save_image(&self.image_dir, &stem, data, mime_type).await?;
                    report.images.push(path);
                    report.text.push_str(IMAGE_PLACEHOLDER);
                }
            }
        }
        Ok(report)
    }
}

/// System prompt carrying today's date.
pub fn system_prompt() -> String {
    format!(
        "You are a helpful assistant. Today's date is {}. \
         If a user asks for a chart or graph, use the '{}' tool.",
        Local::now().format("%Y-%m-%d"),
        VISUALIZATION_TOOL
    )
}

/// Models sometimes send an empty string for no arguments.
fn parse_arguments(raw: &str) -> Result<Map<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(format!("arguments must be a JSON object, got {}", other)),
        Err(e) => Err(format!("arguments are not valid JSON: {}", e)),
    }
}
