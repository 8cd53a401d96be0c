//! Config sections. Every field has a default so partial files are fine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where the tool server listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    /// Default: 0.0.0.0
    pub host: String,

    /// Default: 8000
    pub port: u16,
}

impl BindConfig {
    /// `host:port` for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Stream and message endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Exact path for opening the event stream.
    pub stream_path: String,

    /// Exact path for submitting invocations.
    pub message_path: String,

    /// Extra exact paths accepted for submissions.
    pub message_aliases: Vec<String>,

    /// Seconds between keep-alive comments on idle streams.
    pub keep_alive_secs: u64,

    /// Upper bound on one tool call. Unset means no limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_timeout_secs: Option<u64>,

    /// Outbound events buffered per stream.
    pub event_buffer: usize,

    /// Largest accepted submission body in bytes.
    pub max_body_bytes: usize,
}

impl TransportConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs.max(1))
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            stream_path: "/sse".to_string(),
            message_path: "/messages".to_string(),
            message_aliases: vec!["/sse/messages".to_string()],
            keep_alive_secs: 15,
            tool_timeout_secs: None,
            event_buffer: 32,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Telemetry and observability configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset.
    /// Default: info
    pub log_level: String,

    /// OTLP gRPC endpoint. Unset disables export.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otlp_endpoint: Option<String>,

    /// Reported as `service.name`.
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            otlp_endpoint: None,
            service_name: "weathervane".to_string(),
        }
    }
}

/// Upstream weather archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Open-Meteo archive endpoint.
    pub archive_url: String,

    /// Per-request timeout against the archive.
    pub request_timeout_secs: u64,
}

impl WeatherConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            archive_url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Agent client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the tool server.
    pub server_url: String,

    /// OpenAI-compatible chat completions base.
    pub api_base: String,

    /// Chat model name.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// File holding the API key, read when the variable is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_file: Option<PathBuf>,

    /// Model turns allowed to request tools before giving up.
    pub max_tool_iterations: usize,

    /// Where generated charts are written.
    pub image_dir: PathBuf,

    /// Client-side wait for one tool result.
    pub call_timeout_secs: u64,
}

impl AgentConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            api_base: "https://api.mistral.ai/v1".to_string(),
            model: "mistral-large-latest".to_string(),
            api_key_env: "MISTRAL_API_KEY".to_string(),
            api_key_file: None,
            max_tool_iterations: 8,
            image_dir: PathBuf::from("charts"),
            call_timeout_secs: 120,
        }
    }
}
