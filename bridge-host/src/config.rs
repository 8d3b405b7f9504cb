//! Bridge host configuration.

use crate::error::{BridgeError, BridgeResult};
use flts_native_messaging::{config::load_config_file, NativeMessagingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "flts-chrome-bridge.toml";

/// Port-only config file read by earlier bridge releases:
///
/// ```ini
/// [PORT]
/// Number=9413
/// ```
pub const LEGACY_CONFIG_FILE: &str = "conf";

/// Default log file; stdout carries the protocol so logs cannot go there.
pub const DEFAULT_LOG_FILE: &str = "flts-chrome-bridge.log";

#[derive(Debug, Deserialize)]
struct LegacyConfig {
    #[serde(rename = "PORT")]
    port: LegacyPortSection,
}

#[derive(Debug, Deserialize)]
struct LegacyPortSection {
    #[serde(rename = "Number", alias = "number")]
    number: u16,
}

/// Bridge host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// TCP port FLTS connects to. Required.
    pub port: Option<u16>,

    /// Address the listener binds to
    pub bind_address: String,

    /// Log file path; `None` logs to stderr
    pub log_file: Option<PathBuf>,

    /// Largest accepted client request in bytes
    pub max_request_size: usize,

    /// Pipe settings for stdin/stdout
    pub native_messaging: NativeMessagingConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            port: None,
            bind_address: "127.0.0.1".to_string(),
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            max_request_size: 64 * 1024,
            native_messaging: NativeMessagingConfig::default(),
        }
    }
}

impl HostConfig {
    /// Configuration listening on `port` with everything else defaulted.
    pub fn with_port(port: u16) -> Self {
        Self {
            port: Some(port),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML or JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        load_config_file(path)
    }

    /// Load the port from a legacy `conf` file; everything else is defaulted.
    ///
    /// The file is INI, but its single `[PORT]` section with `Number=<port>`
    /// is also valid TOML.
    pub fn from_legacy_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let legacy: LegacyConfig = toml::from_str(&content)?;
        Ok(Self::with_port(legacy.port.number))
    }

    /// Listener address, `bind_address:port`.
    pub fn listen_address(&self) -> BridgeResult<String> {
        let port = self
            .port
            .ok_or_else(|| BridgeError::config("port number not specified"))?;
        Ok(format!("{}:{}", self.bind_address, port))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> BridgeResult<()> {
        self.listen_address()?;
        if self.bind_address.is_empty() {
            return Err(BridgeError::config("bind_address cannot be empty"));
        }
        if self.max_request_size == 0 {
            return Err(BridgeError::config("max_request_size must be greater than 0"));
        }
        self.native_messaging
            .validate()
            .map_err(|e| BridgeError::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_port_is_rejected() {
        let config = HostConfig::default();
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_listen_address() {
        let config = HostConfig::with_port(9413);
        assert_eq!(config.listen_address().unwrap(), "127.0.0.1:9413");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_toml_and_json() -> anyhow::Result<()> {
        let dir = TempDir::new()?;

        let toml_path = dir.path().join("bridge.toml");
        std::fs::write(
            &toml_path,
            r#"
port = 9413
log_file = "bridge.log"

[native_messaging]
max_message_size = 4096
"#,
        )?;
        let config = HostConfig::from_file(&toml_path)?;
        assert_eq!(config.port, Some(9413));
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.log_file, Some(PathBuf::from("bridge.log")));
        assert_eq!(config.native_messaging.max_message_size, 4096);

        let json_path = dir.path().join("bridge.json");
        std::fs::write(&json_path, r#"{"port": 7000, "bind_address": "0.0.0.0"}"#)?;
        let config = HostConfig::from_file(&json_path)?;
        assert_eq!(config.listen_address()?, "0.0.0.0:7000");
        Ok(())
    }

    #[test]
    fn test_load_legacy_conf() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(LEGACY_CONFIG_FILE);

        std::fs::write(&path, "[PORT]\nNumber=9413\n")?;
        let config = HostConfig::from_legacy_file(&path)?;
        assert_eq!(config.listen_address()?, "127.0.0.1:9413");
        assert_eq!(config.log_file, Some(PathBuf::from(DEFAULT_LOG_FILE)));
        config.validate()?;

        std::fs::write(&path, "[PORT]\nnumber = 8000\n")?;
        assert_eq!(HostConfig::from_legacy_file(&path)?.port, Some(8000));

        std::fs::write(&path, "[OTHER]\nNumber=1\n")?;
        assert!(HostConfig::from_legacy_file(&path).is_err());
        Ok(())
    }
}
