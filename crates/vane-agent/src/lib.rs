//! vane-agent - answers questions with an LLM and a vane tool server
//!
//! - `settings`: config resolution and API key lookup
//! - `provider`: OpenAI-compatible chat completions
//! - `agent`: the tool-calling loop and chat history
//! - `images`: writing returned charts to disk

pub mod agent;
pub mod error;
pub mod images;
pub mod provider;
pub mod settings;

pub use agent::{Agent, Reply};
pub use error::AgentError;
pub use provider::OpenAiProvider;
pub use settings::AgentSettings;

use vane::client::{ClientOptions, StreamClient};

/// Connect to the tool server and build an agent from settings.
pub async fn connect(settings: &AgentSettings) -> Result<Agent, AgentError> {
    let options = ClientOptions {
        stream_path: settings.stream_path.clone(),
        message_path: settings.message_path.clone(),
        call_timeout: settings.call_timeout,
        ..ClientOptions::default()
    };
    let client = StreamClient::connect(&settings.server_url, options).await?;
    let provider = OpenAiProvider::new(&settings.api_base, &settings.api_key, settings.model.clone());

    Agent::new(
        provider,
        client,
        settings.max_tool_iterations,
        settings.image_dir.clone(),
    )
}
