//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::client::ClientConfig;
use crate::sandbox::SandboxConfig;
use crate::views::{UploadEndpoints, UploadTarget};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub sandbox: SandboxSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Main API connection
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}

/// Where the session token is kept between runs
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_file")]
    pub file: String,
}

fn default_session_file() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("fee-sentinel").join("session.json"))
        .unwrap_or_else(|| PathBuf::from("./.fee-sentinel-session.json"))
        .to_string_lossy()
        .to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file: default_session_file(),
        }
    }
}

/// OCR extraction deployments
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_local_upload")]
    pub local_url: String,

    #[serde(default = "default_hosted_upload")]
    pub hosted_url: String,

    /// "local" or "hosted"
    #[serde(default = "default_upload_target")]
    pub target: String,
}

fn default_local_upload() -> String {
    UploadEndpoints::default().local
}

fn default_hosted_upload() -> String {
    UploadEndpoints::default().hosted
}

fn default_upload_target() -> String {
    "hosted".to_string()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            local_url: default_local_upload(),
            hosted_url: default_hosted_upload(),
            target: default_upload_target(),
        }
    }
}

impl UploadConfig {
    pub fn endpoints(&self) -> UploadEndpoints {
        UploadEndpoints {
            local: self.local_url.clone(),
            hosted: self.hosted_url.clone(),
        }
    }

    /// Configured target; unknown values fall back to hosted
    pub fn target(&self) -> UploadTarget {
        self.target.parse().unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            UploadTarget::Hosted
        })
    }
}

/// Sandbox server settings
#[derive(Debug, Clone, Deserialize)]
pub struct SandboxSection {
    #[serde(default = "default_sandbox_host")]
    pub host: String,

    #[serde(default = "default_sandbox_port")]
    pub port: u16,

    #[serde(default = "default_require_auth")]
    pub require_auth: bool,

    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
}

fn default_sandbox_host() -> String {
    "127.0.0.1".to_string()
}

fn default_sandbox_port() -> u16 {
    5000
}

fn default_require_auth() -> bool {
    true
}

fn default_z_threshold() -> f64 {
    2.0
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            host: default_sandbox_host(),
            port: default_sandbox_port(),
            require_auth: default_require_auth(),
            z_threshold: default_z_threshold(),
        }
    }
}

impl SandboxSection {
    pub fn sandbox_config(&self) -> SandboxConfig {
        SandboxConfig {
            host: self.host.clone(),
            port: self.port,
            require_auth: self.require_auth,
            z_threshold: self.z_threshold,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("fee-sentinel").join("config.toml")),
            Some(PathBuf::from("/etc/fee-sentinel/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // API overrides
        if let Some(url) = var("FEE_SENTINEL_API_URL") {
            self.api.base_url = url;
        }

        // Session overrides
        if let Some(file) = var("FEE_SENTINEL_SESSION_FILE") {
            self.session.file = file;
        }

        // Upload overrides
        if let Some(target) = var("FEE_SENTINEL_UPLOAD_TARGET") {
            self.upload.target = target;
        }

        // Sandbox overrides
        if let Some(host) = var("FEE_SENTINEL_SANDBOX_HOST") {
            self.sandbox.host = host;
        }
        if let Some(port) = var("FEE_SENTINEL_SANDBOX_PORT") {
            if let Ok(p) = port.parse() {
                self.sandbox.port = p;
            }
        }

        // Logging overrides
        if let Some(level) = var("FEE_SENTINEL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("FEE_SENTINEL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Fee Sentinel Configuration
#
# Environment variables override these settings:
# - FEE_SENTINEL_API_URL
# - FEE_SENTINEL_SESSION_FILE
# - FEE_SENTINEL_UPLOAD_TARGET
# - FEE_SENTINEL_SANDBOX_HOST
# - FEE_SENTINEL_SANDBOX_PORT
# - FEE_SENTINEL_LOG_LEVEL
# - FEE_SENTINEL_LOG_FORMAT

[api]
# Asset-management API base URL
base_url = "http://127.0.0.1:5000"

# Request timeout in seconds
request_timeout_secs = 30

[session]
# Where the bearer token and user profile are stored
# file = "~/.local/share/fee-sentinel/session.json"

[upload]
# OCR extraction deployments
local_url = "http://127.0.0.1:5001/api/upload-pdf"
hosted_url = "https://ocr-backend-app.azurewebsites.net/api/upload-pdf"

# Default target: local or hosted
target = "hosted"

[sandbox]
# Sandbox server host and port
host = "127.0.0.1"
port = 5000

# Require a bearer token for portfolio and anomaly routes
require_auth = true

# Minimum |z-score| for a fee to be flagged
z_threshold = 2.0

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.upload.target(), UploadTarget::Hosted);
        assert_eq!(config.sandbox.port, 5000);
        assert!(config.sandbox.require_auth);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse("[api]\nbase_url = \"http://api.test\"\n").unwrap();
        assert_eq!(config.api.base_url, "http://api.test");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url =").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FEE_SENTINEL_API_URL", "http://override"),
            ("FEE_SENTINEL_UPLOAD_TARGET", "local"),
            ("FEE_SENTINEL_SANDBOX_PORT", "not-a-port"),
            ("FEE_SENTINEL_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "http://override");
        assert_eq!(config.upload.target(), UploadTarget::Local);
        assert_eq!(config.sandbox.port, 5000);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_unknown_upload_target_falls_back() {
        let mut config = Config::default();
        config.upload.target = "mars".to_string();
        assert_eq!(config.upload.target(), UploadTarget::Hosted);
    }
}
