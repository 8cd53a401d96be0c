//! OpenAI-compatible chat completions, Mistral by default.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolType, ChatCompletionToolChoiceOption,
    CreateChatCompletionRequestArgs, FinishReason, FunctionCall, FunctionObjectArgs,
};
use async_openai::Client;
use vane::ToolDescriptor;

use crate::error::AgentError;

/// A tool call the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestedCall {
    pub id: String,
    pub name: String,
    /// Raw JSON text as the model produced it.
    pub arguments: String,
}

/// One model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<RequestedCall>,
    pub finish_reason: Option<FinishReason>,
}

impl ModelTurn {
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Messages the agent sends, independent of the wire types.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    System(String),
    User(String),
    Assistant {
        content: Option<String>,
        tool_calls: Vec<RequestedCall>,
    },
    Tool {
        call_id: String,
        content: String,
    },
}

/// Chat client for one model.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_base: &str, api_key: &str, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base.trim_end_matches('/'))
            .with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the conversation and return the first choice.
    #[tracing::instrument(skip(self, messages, tools), fields(model = %self.model, messages = messages.len()))]
    pub async fn chat(
        &self,
        messages: &[Message],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelTurn, AgentError> {
        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(self.model.clone())
            .messages(convert_messages(messages)?);
        if !tools.is_empty() {
            request
                .tools(tools.to_vec())
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }
        let request = request.build()?;

        let response = self.client.chat().create(request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(AgentError::EmptyResponse)?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| RequestedCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            finish_reason = ?choice.finish_reason,
            tool_calls = tool_calls.len(),
            "Model replied"
        );

        Ok(ModelTurn {
            content: choice.message.content,
            tool_calls,
            finish_reason: choice.finish_reason,
        })
    }
}

/// Convert handshake descriptors into function tools.
pub fn convert_tools(tools: &[ToolDescriptor]) -> Result<Vec<ChatCompletionTool>, AgentError> {
    tools
        .iter()
        .map(|tool| {
            let function = FunctionObjectArgs::default()
                .name(tool.name.clone())
                .description(tool.description.clone())
                .parameters(tool.schema.to_value())
                .build()?;
            Ok(ChatCompletionToolArgs::default()
                .r#type(ChatCompletionToolType::Function)
                .function(function)
                .build()?)
        })
        .collect()
}

fn convert_messages(messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
    messages
        .iter()
        .map(|message| {
            let converted: ChatCompletionRequestMessage = match message {
                Message::System(text) => ChatCompletionRequestSystemMessageArgs::default()
                    .content(text.as_str())
                    .build()?
                    .into(),
                Message::User(text) => ChatCompletionRequestUserMessageArgs::default()
                    .content(text.as_str())
                    .build()?
                    .into(),
                Message::Assistant {
                    content,
                    tool_calls,
                } => {
                    let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                    if let Some(text) = content {
                        args.content(text.as_str());
                    }
                    if !tool_calls.is_empty() {
                        args.tool_calls(
                            tool_calls
                                .iter()
                                .map(|call| ChatCompletionMessageToolCall {
                                    id: call.id.clone(),
                                    r#type: ChatCompletionToolType::Function,
                                    function: FunctionCall {
                                        name: call.name.clone(),
                                        arguments: call.arguments.clone(),
                                    },
                                })
                                .collect::<Vec<_>>(),
                        );
                    }
                    args.build()?.into()
                }
                Message::Tool { call_id, content } => ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(call_id.as_str())
                    .content(content.as_str())
                    .build()?
                    .into(),
            };
            Ok(converted)
        })
        .collect()
}
