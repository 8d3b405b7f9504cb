//! Configuration for the native messaging pipe.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Chrome refuses host-to-browser messages above 1 MiB.
pub const CHROME_MAX_MESSAGE_SIZE: usize = 1_048_576;

/// Configuration shared by both ends of the native messaging pipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeMessagingConfig {
    /// Maximum message size in bytes (Chrome limit is 1MB)
    pub max_message_size: usize,

    /// Log every inbound and outbound message at debug level
    pub enable_logging: bool,
}

impl Default for NativeMessagingConfig {
    fn default() -> Self {
        Self {
            max_message_size: CHROME_MAX_MESSAGE_SIZE,
            enable_logging: true,
        }
    }
}

impl NativeMessagingConfig {
    /// Load configuration from a file.
    ///
    /// Files ending in `.toml` are parsed as TOML, everything else as JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        load_config_file(path)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_message_size == 0 {
            return Err(anyhow::anyhow!("max_message_size must be greater than 0"));
        }

        if self.max_message_size > CHROME_MAX_MESSAGE_SIZE {
            return Err(anyhow::anyhow!("max_message_size cannot exceed Chrome's 1MB limit"));
        }

        Ok(())
    }
}

/// Read a TOML or JSON config file, picking the format from the extension.
pub fn load_config_file<T, P>(path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
        toml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    Ok(config)
}

/// Write a TOML or JSON config file, picking the format from the extension.
pub fn save_config_file<T, P>(config: &T, path: P) -> anyhow::Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let content = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
        toml::to_string_pretty(config)?
    } else {
        serde_json::to_string_pretty(config)?
    };

    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = NativeMessagingConfig::default();
        assert_eq!(config.max_message_size, 1_048_576);
        assert!(config.enable_logging);
    }

    #[test]
    fn test_config_validation() {
        let mut config = NativeMessagingConfig::default();
        assert!(config.validate().is_ok());

        config.max_message_size = 0;
        assert!(config.validate().is_err());

        config.max_message_size = 2_000_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let config = NativeMessagingConfig {
            max_message_size: 4096,
            enable_logging: false,
        };

        let json_path = dir.path().join("nm.json");
        save_config_file(&config, &json_path)?;
        assert_eq!(NativeMessagingConfig::from_file(&json_path)?, config);

        let toml_path = dir.path().join("nm.toml");
        save_config_file(&config, &toml_path)?;
        assert_eq!(NativeMessagingConfig::from_file(&toml_path)?, config);

        Ok(())
    }

    #[test]
    fn test_partial_toml_uses_defaults() -> anyhow::Result<()> {
        let config: NativeMessagingConfig = toml::from_str("enable_logging = false")?;
        assert_eq!(config.max_message_size, CHROME_MAX_MESSAGE_SIZE);
        assert!(!config.enable_logging);
        Ok(())
    }
}
