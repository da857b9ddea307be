use serde::{Deserialize, Serialize};

use super::dnssec::DnssecConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::proxy::{ProxyConfig, MAX_INPUT_INTERFACES, MIN_MESSAGE_SIZE};

/// Main configuration structure for the DNS proxy
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Interfaces, message limits and DNSSEC wait settings
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Trust anchors handed to the validator
    #[serde(default)]
    pub dnssec: DnssecConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-dnsproxy.toml in current directory
    /// 3. /etc/ferrous-dnsproxy/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(found) = Self::get_config_path() {
            Self::from_file(&found)?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let proxy = &self.proxy;

        if proxy.input_interfaces.len() > MAX_INPUT_INTERFACES {
            return Err(ConfigError::Validation(format!(
                "At most {} input interfaces are supported, got {}",
                MAX_INPUT_INTERFACES,
                proxy.input_interfaces.len()
            )));
        }

        if !proxy.input_interfaces.is_empty() && proxy.output_interface == 0 {
            return Err(ConfigError::Validation(
                "Output interface cannot be 0 when input interfaces are configured".to_string(),
            ));
        }

        if !(MIN_MESSAGE_SIZE..=65_535).contains(&proxy.absolute_max_message_size) {
            return Err(ConfigError::Validation(format!(
                "absolute_max_message_size must be between {} and 65535, got {}",
                MIN_MESSAGE_SIZE, proxy.absolute_max_message_size
            )));
        }

        for anchor in &self.dnssec.trust_anchors {
            anchor.validate()?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new("ferrous-dnsproxy.toml").exists() {
            Some("ferrous-dnsproxy.toml".to_string())
        } else if std::path::Path::new("/etc/ferrous-dnsproxy/config.toml").exists() {
            Some("/etc/ferrous-dnsproxy/config.toml".to_string())
        } else {
            None
        }
    }
}
