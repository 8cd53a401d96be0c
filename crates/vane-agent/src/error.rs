use thiserror::Error;
use vane::client::ClientError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("No API key: set {env} or configure agent.api_key_file")]
    MissingApiKey { env: String },

    #[error("Failed to read API key file {path}: {source}")]
    ApiKeyFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Model request failed: {0}")]
    Model(#[from] async_openai::error::OpenAIError),

    #[error("Model returned no choices")]
    EmptyResponse,

    #[error("Tool server error: {0}")]
    ToolServer(#[from] ClientError),

    #[error("Model kept calling tools after {0} rounds")]
    TooManyToolRounds(usize),

    #[error("Failed to save image: {0}")]
    Image(String),
}
