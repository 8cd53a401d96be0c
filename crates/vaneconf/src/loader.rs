//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, VaneConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local). Only returns files
/// that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local override. A missing
/// `cli_path` is still returned so loading reports it.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/weathervane/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("weathervane/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("weathervane.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read one file as a raw TOML table.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // Type errors are reported against the file that caused them
    toml::Value::Table(table.clone())
        .try_into::<VaneConfig>()
        .map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(table)
}

/// Merge `overlay` into `base`. Nested tables merge key by key; any other
/// value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut VaneConfig, sources: &mut ConfigSources) {
    apply_env_overrides_with(config, sources, |name| env::var(name).ok());
}

/// Apply overrides read through `lookup`. Unparseable numbers are ignored.
pub fn apply_env_overrides_with<F>(config: &mut VaneConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut record = |name: &str| sources.env_overrides.push(name.to_string());

    // Bind
    if let Some(v) = lookup("WEATHERVANE_HOST") {
        config.bind.host = v;
        record("WEATHERVANE_HOST");
    }
    // Platform-provided PORT loses to the explicit variable
    for name in ["PORT", "WEATHERVANE_PORT"] {
        if let Some(port) = lookup(name).and_then(|v| v.parse().ok()) {
            config.bind.port = port;
            record(name);
        }
    }

    // Transport
    if let Some(secs) = lookup("WEATHERVANE_TOOL_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.transport.tool_timeout_secs = Some(secs);
        record("WEATHERVANE_TOOL_TIMEOUT_SECS");
    }
    if let Some(secs) = lookup("WEATHERVANE_KEEP_ALIVE_SECS").and_then(|v| v.parse().ok()) {
        config.transport.keep_alive_secs = secs;
        record("WEATHERVANE_KEEP_ALIVE_SECS");
    }

    // Telemetry
    if let Some(v) = lookup("WEATHERVANE_LOG_LEVEL") {
        config.telemetry.log_level = v;
        record("WEATHERVANE_LOG_LEVEL");
    }
    // Also support standard OTEL env var
    if let Some(v) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = Some(v);
        record("OTEL_EXPORTER_OTLP_ENDPOINT");
    }
    if let Some(v) = lookup("WEATHERVANE_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = Some(v);
        record("WEATHERVANE_OTLP_ENDPOINT");
    }

    // Weather
    if let Some(v) = lookup("WEATHERVANE_ARCHIVE_URL") {
        config.weather.archive_url = v;
        record("WEATHERVANE_ARCHIVE_URL");
    }

    // Agent
    if let Some(v) = lookup("WEATHERVANE_SERVER_URL") {
        config.agent.server_url = v;
        record("WEATHERVANE_SERVER_URL");
    }
    if let Some(v) = lookup("WEATHERVANE_API_BASE") {
        config.agent.api_base = v;
        record("WEATHERVANE_API_BASE");
    }
    if let Some(v) = lookup("WEATHERVANE_MODEL") {
        config.agent.model = v;
        record("WEATHERVANE_MODEL");
    }
    if let Some(v) = lookup("WEATHERVANE_API_KEY_FILE") {
        config.agent.api_key_file = Some(expand_path(&v));
        record("WEATHERVANE_API_KEY_FILE");
    }
    if let Some(v) = lookup("WEATHERVANE_IMAGE_DIR") {
        config.agent.image_dir = expand_path(&v);
        record("WEATHERVANE_IMAGE_DIR");
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn table(s: &str) -> toml::Table {
        s.parse().unwrap()
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/test/path");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_absolute() {
        let expanded = expand_path("/absolute/path");
        assert_eq!(expanded, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_discover_config_files() {
        // Just verify it doesn't panic
        let _files = discover_config_files();
    }

    #[test]
    fn test_cli_path_replaces_local() {
        let files = discover_config_files_with_override(Some(Path::new("/nonexistent/custom.toml")));
        assert_eq!(files.last(), Some(&PathBuf::from("/nonexistent/custom.toml")));
    }

    #[test]
    fn test_merge_keeps_untouched_keys() {
        let mut base = table(
            r#"
[bind]
host = "127.0.0.1"
port = 9000
"#,
        );
        merge_tables(&mut base, table("[bind]\nport = 9100\n"));

        let bind = base["bind"].as_table().unwrap();
        assert_eq!(bind["host"].as_str(), Some("127.0.0.1"));
        assert_eq!(bind["port"].as_integer(), Some(9100));
    }

    #[test]
    fn test_merge_replaces_arrays() {
        let mut base = table("[transport]\nmessage_aliases = [\"/a\", \"/b\"]\n");
        merge_tables(&mut base, table("[transport]\nmessage_aliases = []\n"));
        assert!(base["transport"]["message_aliases"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "7000"),
            ("WEATHERVANE_HOST", "127.0.0.1"),
            ("WEATHERVANE_TOOL_TIMEOUT_SECS", "45"),
            ("WEATHERVANE_MODEL", "mistral-small-latest"),
            ("WEATHERVANE_OTLP_ENDPOINT", "http://collector:4317"),
        ]);
        let mut config = VaneConfig::default();
        let mut sources = ConfigSources::default();

        apply_env_overrides_with(&mut config, &mut sources, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.bind.port, 7000);
        assert_eq!(config.bind.host, "127.0.0.1");
        assert_eq!(config.transport.tool_timeout_secs, Some(45));
        assert_eq!(config.agent.model, "mistral-small-latest");
        assert_eq!(config.telemetry.otlp_endpoint.as_deref(), Some("http://collector:4317"));
        assert_eq!(sources.env_overrides.len(), 5);
    }

    #[test]
    fn test_explicit_port_beats_platform_port() {
        let env = HashMap::from([("PORT", "7000"), ("WEATHERVANE_PORT", "7100")]);
        let mut config = VaneConfig::default();
        let mut sources = ConfigSources::default();

        apply_env_overrides_with(&mut config, &mut sources, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.bind.port, 7100);
    }

    #[test]
    fn test_bad_number_is_ignored() {
        let env = HashMap::from([("WEATHERVANE_PORT", "eighty")]);
        let mut config = VaneConfig::default();
        let mut sources = ConfigSources::default();

        apply_env_overrides_with(&mut config, &mut sources, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.bind.port, 8000);
        assert!(sources.env_overrides.is_empty());
    }
}
