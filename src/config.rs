//! Runtime configuration for the CLI and the HTTP facade

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure loaded from disk and environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MnbQrConfig {
    /// Logging configuration
    pub logging: LoggingOptions,
    /// HTTP facade configuration
    pub server: ServerOptions,
    /// Image output configuration
    pub output: OutputOptions,
}

impl MnbQrConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No mnbqr.toml / mnbqr.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["mnbqr.toml", "mnbqr.yaml", "mnbqr.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("mnbqr");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        Self::parse(&contents, &extension)
            .map_err(|e| Error::Config(format!("{} ({})", e, path.display())))
    }

    /// Parse configuration text in the format named by `extension`.
    pub fn parse(contents: &str, extension: &str) -> std::result::Result<Self, String> {
        match extension {
            "toml" => toml::from_str(contents).map_err(|e| format!("Failed to parse TOML: {e}")),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| format!("Failed to parse YAML: {e}"))
            }
            other => Err(format!(
                "Unsupported config format '{other}', expected toml/yaml"
            )),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.logging.apply_env_overrides();
        self.server.apply_env_overrides();
        self.output.apply_env_overrides();
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `MNBQR_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in terminal logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("MNBQR_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("MNBQR_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("MNBQR_LOG_COLOR") {
            if let Some(parsed) = parse_flag(&color) {
                self.color = parsed;
            }
        }
        if let Ok(rotation) = env::var("MNBQR_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::parse(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

/// HTTP facade binding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    /// Bind address for the HTTP facade
    pub bind_address: String,
    /// Bind port for the HTTP facade
    pub port: u16,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            max_body_bytes: 16 * 1024,
        }
    }
}

impl ServerOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(addr) = env::var("MNBQR_BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Ok(port) = env::var("MNBQR_BIND_PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                self.port = parsed;
            }
        }
        if let Ok(limit) = env::var("MNBQR_MAX_BODY_BYTES") {
            if let Ok(parsed) = limit.parse::<usize>() {
                self.max_body_bytes = parsed.max(1024);
            }
        }
    }

    /// Socket address helper for binding servers
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Where and how generated images are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Minimum PNG width and height in pixels
    pub png_size: u32,
    /// Destination of the generated PNG
    pub path: PathBuf,
    /// Validity window in seconds for codes generated from the CLI
    pub valid_for_secs: i64,
    /// Program used to open the generated image
    pub viewer: Option<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            png_size: 256,
            path: PathBuf::from("out.png"),
            valid_for_secs: 2 * 60 * 60,
            viewer: Some(default_viewer().to_string()),
        }
    }
}

impl OutputOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(size) = env::var("MNBQR_PNG_SIZE") {
            if let Ok(parsed) = size.parse::<u32>() {
                self.png_size = parsed;
            }
        }
        if let Ok(path) = env::var("MNBQR_OUTPUT") {
            self.path = PathBuf::from(path);
        }
        if let Ok(secs) = env::var("MNBQR_VALID_FOR_SECS") {
            if let Ok(parsed) = secs.parse::<i64>() {
                self.valid_for_secs = parsed;
            }
        }
        if let Ok(viewer) = env::var("MNBQR_VIEWER") {
            if viewer.trim().is_empty() {
                self.viewer = None;
            } else {
                self.viewer = Some(viewer);
            }
        }
    }
}

fn default_viewer() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MnbQrConfig::default();
        assert_eq!(config.server.socket_address(), "0.0.0.0:8080");
        assert_eq!(config.output.png_size, 256);
        assert_eq!(config.output.valid_for_secs, 7200);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_toml_partial() {
        let config = MnbQrConfig::parse(
            r#"
[server]
port = 9000

[output]
png_size = 512
viewer = "feh"

[logging]
rotation = "daily"
"#,
            "toml",
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.output.png_size, 512);
        assert_eq!(config.output.viewer.as_deref(), Some("feh"));
        assert_eq!(config.logging.rotation, Some(LogRotation::Daily));
    }

    #[test]
    fn test_parse_yaml() {
        let config = MnbQrConfig::parse(
            "server:\n  bind_address: 127.0.0.1\noutput:\n  path: codes/pay.png\n",
            "yaml",
        )
        .unwrap();

        assert_eq!(config.server.socket_address(), "127.0.0.1:8080");
        assert_eq!(config.output.path, PathBuf::from("codes/pay.png"));
    }

    #[test]
    fn test_unsupported_format() {
        let err = MnbQrConfig::parse("{}", "json").unwrap_err();
        assert!(err.contains("Unsupported config format 'json'"));
    }

    #[test]
    fn test_flags() {
        assert_eq!(parse_flag("ON"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(LogRotation::parse("Hourly"), Some(LogRotation::Hourly));
    }
}
