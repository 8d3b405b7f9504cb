//! Configuration for the extension simulator.

use crate::transport::HostManifest;
use flts_native_messaging::{config::load_config_file, NativeMessagingConfig, DEFAULT_HOST_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension-side configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Host name passed to `connect_native`
    pub host_name: String,

    /// Registered host executables
    pub hosts: Vec<HostManifest>,

    /// JSON file with the initial windows and tabs
    pub fixture: Option<PathBuf>,

    /// Pipe settings
    pub native_messaging: NativeMessagingConfig,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            host_name: DEFAULT_HOST_NAME.to_string(),
            hosts: Vec::new(),
            fixture: None,
            native_messaging: NativeMessagingConfig::default(),
        }
    }
}

impl ExtensionConfig {
    /// Load configuration from a TOML or JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        load_config_file(path)
    }

    /// Register (or replace) the executable for `host_name`.
    pub fn register_host(&mut self, path: PathBuf) {
        let name = self.host_name.clone();
        self.hosts.retain(|h| h.name != name);
        self.hosts.push(HostManifest {
            name,
            path,
            args: Vec::new(),
        });
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host_name.is_empty() {
            return Err(anyhow::anyhow!("host_name cannot be empty"));
        }
        if !self.hosts.iter().any(|h| h.name == self.host_name) {
            return Err(anyhow::anyhow!(
                "no executable registered for host '{}'",
                self.host_name
            ));
        }
        self.native_messaging.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ExtensionConfig::default();
        assert_eq!(config.host_name, "com.flts.chrome.bridge");
        assert!(config.hosts.is_empty());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_register_host_replaces() {
        let mut config = ExtensionConfig::default();
        config.register_host(PathBuf::from("/a"));
        config.register_host(PathBuf::from("/b"));
        assert_eq!(config.hosts.len(), 1);
        assert_eq!(config.hosts[0].path, PathBuf::from("/b"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_toml() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("extension.toml");
        std::fs::write(
            &path,
            r#"
host_name = "com.flts.chrome.bridge"
fixture = "tabs.json"

[[hosts]]
name = "com.flts.chrome.bridge"
path = "/usr/local/bin/flts-chrome-bridge"
args = ["--config", "bridge.toml"]

[native_messaging]
max_message_size = 65536
"#,
        )?;

        let config = ExtensionConfig::from_file(&path)?;
        assert_eq!(config.fixture, Some(PathBuf::from("tabs.json")));
        assert_eq!(config.hosts[0].args, vec!["--config", "bridge.toml"]);
        assert_eq!(config.native_messaging.max_message_size, 65536);
        assert!(config.native_messaging.enable_logging);
        config.validate()?;
        Ok(())
    }
}
