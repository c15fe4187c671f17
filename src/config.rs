use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    pub polling: PollingConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// RPC client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Ethereum node JSON-RPC endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds. Unset means the client waits for the node indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/// Block polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between two polling cycles
    pub poll_interval_seconds: u64,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server host/bind address
    pub host: String,
    /// Server port
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ethereum-rpc.publicnode.com".to_string(),
            timeout_seconds: None,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 5,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl PollingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    /// Environment variables take precedence over file values
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file; a missing file yields the defaults
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(endpoint) = env::var("ETHEREUM_NODE_RPC_URL") {
            self.rpc.endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("RPC_TIMEOUT_SECONDS") {
            self.rpc.timeout_seconds = Some(parse_env("RPC_TIMEOUT_SECONDS", timeout)?);
        }
        if let Ok(interval) = env::var("POLL_INTERVAL_SECONDS") {
            self.polling.poll_interval_seconds = parse_env("POLL_INTERVAL_SECONDS", interval)?;
        }
        if let Ok(host) = env::var("HTTP_SERVER_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = env::var("HTTP_SERVER_PORT") {
            // Accept the ":3000" listen-address form as well as a bare port
            let bare = port.trim_start_matches(':').to_string();
            self.api.port = parse_env("HTTP_SERVER_PORT", bare)?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rpc.endpoint.starts_with("http://") && !self.rpc.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.rpc.endpoint.clone()));
        }

        if let Some(timeout) = self.rpc.timeout_seconds {
            if timeout == 0 || timeout > 300 {
                return Err(ConfigError::InvalidValue {
                    key: "rpc.timeout_seconds".to_string(),
                    value: timeout.to_string(),
                });
            }
        }

        if self.polling.poll_interval_seconds == 0 || self.polling.poll_interval_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "polling.poll_interval_seconds".to_string(),
                value: self.polling.poll_interval_seconds.to_string(),
            });
        }

        if self.api.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.port".to_string(),
                value: self.api.port.to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default())
            .map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}
