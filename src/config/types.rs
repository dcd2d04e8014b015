//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{default_description, default_sid, default_true, default_version};
use super::limits::LimitsConfig;
use super::listen::ListenConfig;
use super::oper::OperBlock;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    pub server: ServerConfig,
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Protocol limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Message of the Day configuration.
    #[serde(default)]
    pub motd: MotdConfig,
    /// Operator blocks.
    #[serde(default)]
    pub oper: Vec<OperBlock>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Minimal configuration for tests: no DNS, an ephemeral listen port.
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig {
                name: "irc.test".to_string(),
                network: "TestNet".to_string(),
                sid: default_sid(),
                version: default_version(),
                description: default_description(),
                resolve_hostnames: false,
            },
            listen: ListenConfig {
                address: std::net::SocketAddr::from(([127, 0, 0, 1], 0)),
            },
            limits: LimitsConfig::default(),
            logging: LoggingConfig::default(),
            motd: MotdConfig::default(),
            oper: Vec::new(),
        }
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name (e.g., "irc.example.net"), used as message prefix.
    pub name: String,
    /// Network name (e.g., "ExampleNet").
    pub network: String,
    /// Server ID (3 characters), prefixed to connection uids.
    #[serde(default = "default_sid")]
    pub sid: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Server description.
    #[serde(default = "default_description")]
    pub description: String,
    /// Reverse-resolve client addresses before registration completes.
    #[serde(default = "default_true")]
    pub resolve_hostnames: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Message of the Day configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MotdConfig {
    /// Path to a MOTD file; read at startup.
    pub file: Option<String>,
    /// Inline MOTD lines, used when no file is configured or it can't be read.
    #[serde(default)]
    pub lines: Vec<String>,
}

impl MotdConfig {
    /// Resolve the MOTD lines. An empty result means no MOTD (ERR_NOMOTD).
    pub fn load_lines(&self) -> Vec<String> {
        if let Some(ref path) = self.file {
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    return content.lines().map(|s| s.to_string()).collect();
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Failed to read MOTD file");
                }
            }
        }
        self.lines.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[server]
name = "irc.example.net"
network = "ExampleNet"
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: Config = toml::from_str(MINIMAL).expect("parse");
        assert_eq!(config.server.sid, "001");
        assert!(config.server.resolve_hostnames);
        assert_eq!(config.listen.address.port(), 6667);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.oper.is_empty());
    }

    #[test]
    fn full_config_parses() {
        let text = r#"
[server]
name = "irc.example.net"
network = "ExampleNet"
sid = "042"
resolve_hostnames = false

[listen]
address = "127.0.0.1:7000"

[limits]
max_channels = 5

[logging]
format = "json"

[motd]
lines = ["hello", "world"]

[[oper]]
name = "admin"
password = "secret"
global = false
"#;
        let config: Config = toml::from_str(text).expect("parse");
        assert_eq!(config.server.sid, "042");
        assert_eq!(config.limits.max_channels, 5);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.motd.load_lines(), vec!["hello", "world"]);
        assert!(!config.oper[0].global);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(MINIMAL.as_bytes()).expect("write");
        let config = Config::load(file.path()).expect("load");
        assert_eq!(config.server.name, "irc.example.net");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Config::load("/nonexistent/modircd.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn load_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"[server\nname = ").expect("write");
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn motd_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"from file\n").expect("write");
        let motd = MotdConfig {
            file: Some(file.path().to_string_lossy().into_owned()),
            lines: vec!["inline".into()],
        };
        assert_eq!(motd.load_lines(), vec!["from file"]);
    }

    #[test]
    fn motd_unreadable_file_falls_back_to_lines() {
        let motd = MotdConfig {
            file: Some("/nonexistent/motd.txt".into()),
            lines: vec!["inline".into()],
        };
        assert_eq!(motd.load_lines(), vec!["inline"]);
    }
}
