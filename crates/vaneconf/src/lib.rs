//! Layered configuration for weathervane.
//!
//! One file format serves both binaries: the tool server reads `[bind]`,
//! `[transport]`, `[telemetry]` and `[weather]`; the agent reads `[agent]`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use vaneconf::VaneConfig;
//!
//! let config = VaneConfig::load().expect("Failed to load config");
//! println!("Listening on {}", config.bind.addr());
//! println!("Archive: {}", config.weather.archive_url);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, key by key):
//! 1. `/etc/weathervane/config.toml` (system)
//! 2. `~/.config/weathervane/config.toml` (user)
//! 3. `./weathervane.toml` (local override) or `--config <path>`
//! 4. Environment variables (`WEATHERVANE_*`, plus `PORT`)
//!
//! # Example Config
//!
//! ```toml
//! [bind]
//! host = "0.0.0.0"
//! port = 8000
//!
//! [transport]
//! keep_alive_secs = 15
//! tool_timeout_secs = 60
//!
//! [telemetry]
//! log_level = "info"
//! otlp_endpoint = "http://127.0.0.1:4317"
//!
//! [weather]
//! archive_url = "https://archive-api.open-meteo.com/v1/archive"
//!
//! [agent]
//! server_url = "http://localhost:8000"
//! model = "mistral-large-latest"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};
pub use sections::{AgentConfig, BindConfig, TelemetryConfig, TransportConfig, WeatherConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid merged configuration: {0}")]
    Invalid(String),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Complete weathervane configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaneConfig {
    pub bind: BindConfig,
    pub transport: TransportConfig,
    pub telemetry: TelemetryConfig,
    pub weather: WeatherConfig,
    pub agent: AgentConfig,
}

impl VaneConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, letting `config_path` replace `./weathervane.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        let (mut config, mut sources) = Self::from_files(&files)?;

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Merge the given files in order over the defaults. No env overlay.
    pub fn from_files(files: &[PathBuf]) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in files {
            let table = loader::load_table(path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path.clone());
        }

        let config = toml::Value::Table(merged)
            .try_into::<VaneConfig>()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let body = toml::to_string_pretty(self)?;
        Ok(format!("# weathervane configuration\n\n{}", body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = VaneConfig::default();
        assert_eq!(config.bind.addr(), "0.0.0.0:8000");
        assert_eq!(config.transport.stream_path, "/sse");
        assert_eq!(config.transport.message_aliases, vec!["/sse/messages"]);
        assert!(config.transport.tool_timeout_secs.is_none());
        assert!(config.telemetry.otlp_endpoint.is_none());
        assert_eq!(config.agent.model, "mistral-large-latest");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config("[bind]\nport = 9000\n");
        let (config, sources) = VaneConfig::from_files(&[file.path().to_path_buf()]).unwrap();

        assert_eq!(config.bind.port, 9000);
        assert_eq!(config.bind.host, "0.0.0.0");
        assert_eq!(config.weather, WeatherConfig::default());
        assert_eq!(sources.files.len(), 1);
    }

    #[test]
    fn test_later_files_win_per_key() {
        let system = write_config(
            r#"
[bind]
host = "127.0.0.1"
port = 9000

[agent]
model = "mistral-small-latest"
"#,
        );
        let local = write_config("[bind]\nport = 9100\n");

        let (config, _) = VaneConfig::from_files(&[
            system.path().to_path_buf(),
            local.path().to_path_buf(),
        ])
        .unwrap();

        assert_eq!(config.bind.host, "127.0.0.1");
        assert_eq!(config.bind.port, 9100);
        assert_eq!(config.agent.model, "mistral-small-latest");
    }

    #[test]
    fn test_full_file() {
        let file = write_config(
            r#"
[transport]
stream_path = "/events"
message_path = "/submit"
message_aliases = []
keep_alive_secs = 5
tool_timeout_secs = 30

[telemetry]
log_level = "debug"
otlp_endpoint = "http://127.0.0.1:4317"

[weather]
archive_url = "http://localhost:9999/v1/archive"
request_timeout_secs = 5

[agent]
api_key_file = "/run/secrets/mistral"
max_tool_iterations = 3
image_dir = "/tmp/charts"
"#,
        );
        let (config, _) = VaneConfig::from_files(&[file.path().to_path_buf()]).unwrap();

        assert_eq!(config.transport.stream_path, "/events");
        assert!(config.transport.message_aliases.is_empty());
        assert_eq!(config.transport.tool_timeout(), Some(std::time::Duration::from_secs(30)));
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.weather.archive_url, "http://localhost:9999/v1/archive");
        assert_eq!(config.agent.api_key_file, Some(PathBuf::from("/run/secrets/mistral")));
        assert_eq!(config.agent.max_tool_iterations, 3);
    }

    #[test]
    fn test_type_error_names_file() {
        let file = write_config("[bind]\nport = \"eighty\"\n");
        let err = VaneConfig::from_files(&[file.path().to_path_buf()]).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = VaneConfig::from_files(&[PathBuf::from("/nonexistent/weathervane.toml")]).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = VaneConfig::default();
        config.transport.tool_timeout_secs = Some(10);
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[bind]"));
        assert!(rendered.contains("[agent]"));

        let parsed: VaneConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
