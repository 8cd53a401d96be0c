//! Agent settings resolved from config, plus API key lookup.

use std::path::PathBuf;
use std::time::Duration;
use vaneconf::{AgentConfig, VaneConfig};

use crate::error::AgentError;

/// Everything the agent needs to run, with secrets resolved.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub server_url: String,
    pub stream_path: String,
    pub message_path: String,
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub max_tool_iterations: usize,
    pub image_dir: PathBuf,
    pub call_timeout: Duration,
}

impl AgentSettings {
    /// Resolve settings, reading the key from the process environment.
    pub fn from_config(config: &VaneConfig) -> Result<Self, AgentError> {
        Self::from_config_with(config, |name| std::env::var(name).ok())
    }

    /// Resolve settings with a custom environment lookup.
    pub fn from_config_with<F>(config: &VaneConfig, lookup: F) -> Result<Self, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport = &config.transport;
        let config = &config.agent;
        Ok(Self {
            server_url: config.server_url.clone(),
            stream_path: transport.stream_path.clone(),
            message_path: transport.message_path.clone(),
            api_base: config.api_base.clone(),
            api_key: resolve_api_key(config, lookup)?,
            model: config.model.clone(),
            max_tool_iterations: config.max_tool_iterations.max(1),
            image_dir: config.image_dir.clone(),
            call_timeout: config.call_timeout(),
        })
    }
}

/// The environment variable wins; the key file is the fallback.
pub fn resolve_api_key<F>(config: &AgentConfig, lookup: F) -> Result<String, AgentError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(&config.api_key_env).map(|k| k.trim().to_string()) {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    if let Some(path) = &config.api_key_file {
        let contents = std::fs::read_to_string(path).map_err(|source| AgentError::ApiKeyFile {
            path: path.clone(),
            source,
        })?;
        let key = contents.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    Err(AgentError::MissingApiKey {
        env: config.api_key_env.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_key_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();
        let config = AgentConfig {
            api_key_file: Some(file.path().to_path_buf()),
            ..AgentConfig::default()
        };

        let key = resolve_api_key(&config, |name| {
            (name == "MISTRAL_API_KEY").then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(key, "from-env");
    }

    #[test]
    fn test_key_file_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  sk-test  ").unwrap();
        let config = AgentConfig {
            api_key_file: Some(file.path().to_path_buf()),
            ..AgentConfig::default()
        };

        assert_eq!(resolve_api_key(&config, |_| None).unwrap(), "sk-test");
    }

    #[test]
    fn test_blank_env_falls_through() {
        let config = AgentConfig::default();
        let err = resolve_api_key(&config, |_| Some("   ".into())).unwrap_err();
        assert!(matches!(err, AgentError::MissingApiKey { .. }));
    }

    #[test]
    fn test_unreadable_key_file() {
        let config = AgentConfig {
            api_key_file: Some(PathBuf::from("/nonexistent/mistral.txt")),
            ..AgentConfig::default()
        };
        let err = resolve_api_key(&config, |_| None).unwrap_err();
        assert!(matches!(err, AgentError::ApiKeyFile { .. }));
    }

    #[test]
    fn test_iterations_never_zero() {
        let mut config = VaneConfig::default();
        config.agent.max_tool_iterations = 0;
        config.transport.stream_path = "/events".into();
        let settings = AgentSettings::from_config_with(&config, |_| Some("k".into())).unwrap();
        assert_eq!(settings.max_tool_iterations, 1);
        assert_eq!(settings.stream_path, "/events");
    }
}
