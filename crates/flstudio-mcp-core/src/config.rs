//! Configuration types for the FL Studio MCP toolkit.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::InstallLayout;

/// Default TCP port of the remote script.
pub const DEFAULT_PORT: u16 = 9050;

/// Top-level configuration loaded from YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Command bridge settings
    pub bridge: BridgeSettings,
    /// Installer settings
    pub install: InstallSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| crate::Error::fs(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: ServerConfig =
            serde_yaml::from_str(yaml).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        self.bridge.validate()?;
        self.logging.validate()
    }
}

/// Settings shared by the bridge server and client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Host the remote script listens on
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Client connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Client wait for a response in milliseconds
    pub response_timeout_ms: u64,
    /// Server limit for executing a single command
    pub command_timeout_ms: u64,
    /// Reconnect attempts before the client falls back to simulation
    pub max_reconnect_attempts: u32,
    /// Delay between reconnect attempts in milliseconds
    pub reconnect_delay_ms: u64,
    /// Size of a single socket read
    pub read_buffer_bytes: usize,
    /// Largest accepted message
    pub max_message_bytes: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            connect_timeout_ms: 3000,
            response_timeout_ms: 5000,
            command_timeout_ms: 10_000,
            max_reconnect_attempts: 3,
            reconnect_delay_ms: 500,
            read_buffer_bytes: 8192,
            max_message_bytes: 1024 * 1024,
        }
    }
}

impl BridgeSettings {
    /// `host:port` string for connecting or binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Response timeout as a [`Duration`].
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Command execution timeout as a [`Duration`].
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Reconnect delay as a [`Duration`].
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Validate bridge values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.host.trim().is_empty() {
            return Err(crate::Error::Config("bridge.host cannot be empty".into()));
        }
        if self.port == 0 {
            return Err(crate::Error::Config("bridge.port must be > 0".into()));
        }
        if self.connect_timeout_ms == 0
            || self.response_timeout_ms == 0
            || self.command_timeout_ms == 0
        {
            return Err(crate::Error::Config("bridge timeouts must be > 0".into()));
        }
        if self.read_buffer_bytes == 0 {
            return Err(crate::Error::Config(
                "bridge.read_buffer_bytes must be > 0".into(),
            ));
        }
        if self.max_message_bytes < self.read_buffer_bytes {
            return Err(crate::Error::Config(
                "bridge.max_message_bytes must be >= bridge.read_buffer_bytes".into(),
            ));
        }
        Ok(())
    }
}

/// Installer settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InstallSettings {
    /// Installation directories to probe, in order (empty = built-in list)
    pub candidate_dirs: Vec<PathBuf>,
    /// Directory containing the bundled script folders (default: next to the executable)
    pub bundle_root: Option<PathBuf>,
    /// Destination layout
    pub layout: InstallLayout,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    pub level: String,
    /// Also append plain-text logs to this file
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingSettings {
    /// Validate logging values.
    pub fn validate(&self) -> crate::Result<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(crate::Error::Config(format!(
                "logging.level '{}' is not one of {}",
                self.level,
                LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bridge.port, 9050);
        assert_eq!(config.bridge.address(), "localhost:9050");
        assert_eq!(config.bridge.max_reconnect_attempts, 3);
        assert_eq!(config.bridge.read_buffer_bytes, 8192);
        assert_eq!(config.install.layout, InstallLayout::SitePackages);
        assert!(config.install.candidate_dirs.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_port() {
        let mut config = ServerConfig::default();
        config.bridge.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_timeouts() {
        let mut config = ServerConfig::default();
        config.bridge.response_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_message_limit_below_buffer() {
        let mut config = ServerConfig::default();
        config.bridge.max_message_bytes = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = ServerConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
bridge:
  host: 127.0.0.1
  port: 9877
  max_reconnect_attempts: 5
  reconnect_delay_ms: 250

install:
  candidate_dirs:
    - "D:/Audio/FL Studio 21"
  bundle_root: "./dist"
  layout: hardware

logging:
  level: debug
  file: flstudio_mcp.log
"#;

        let config = ServerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.bridge.address(), "127.0.0.1:9877");
        assert_eq!(config.bridge.max_reconnect_attempts, 5);
        assert_eq!(config.bridge.reconnect_delay(), Duration::from_millis(250));
        assert_eq!(config.bridge.response_timeout_ms, 5000);
        assert_eq!(config.install.candidate_dirs.len(), 1);
        assert_eq!(config.install.bundle_root, Some(PathBuf::from("./dist")));
        assert_eq!(config.install.layout, InstallLayout::Hardware);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("flstudio_mcp.log")));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ServerConfig::from_yaml("logging:\n  level: warn\n").unwrap();
        assert_eq!(config.bridge.port, DEFAULT_PORT);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_malformed_yaml() {
        let result = ServerConfig::from_yaml("bridge: [unclosed");
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }
}
