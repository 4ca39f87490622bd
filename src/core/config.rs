//! Configuration management for the harness
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/midscene/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{HarnessError, Result};
use crate::planning::Language;

/// Main configuration for the harness
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Fixture and registry configuration
    #[serde(default)]
    pub harness: HarnessConfig,
    /// Planning prompt configuration
    #[serde(default)]
    pub planning: PlanningConfig,
}

/// Fixture and registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Prefix of every agent test id (default: playwright)
    pub driver_tag: String,
    /// Upper bound of the network idle wait before each operation
    /// Default: 20000
    pub network_idle_timeout_ms: u64,
    /// Run operations on the same page one at a time
    pub serialize_page_operations: bool,
}

/// Planning prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Language of the `Thought` part; derived from the timezone when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// Log raw model output and lower the default log level to `debug`
    pub debug: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            driver_tag: env::var("MIDSCENE_DRIVER_TAG").unwrap_or_else(|_| "playwright".to_string()),
            network_idle_timeout_ms: env::var("MIDSCENE_NETWORK_IDLE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20000),
            serialize_page_operations: true,
        }
    }
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            language: env::var("MIDSCENE_LANGUAGE")
                .ok()
                .and_then(|v| v.parse().ok()),
            debug: env::var("MIDSCENE_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl HarnessConfig {
    /// Network idle bound as a duration
    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.network_idle_timeout_ms)
    }
}

impl Config {
    /// Log filter used when `RUST_LOG` is unset
    pub fn default_log_level(&self) -> &'static str {
        if self.planning.debug {
            "debug"
        } else {
            "warn"
        }
    }

    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("midscene")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_env();
        config
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(HarnessError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| HarnessError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| HarnessError::config(format!("Failed to parse config: {}", e)))
    }

    /// Overlay environment variables on values read from a file
    fn apply_env(&mut self) {
        if let Ok(tag) = env::var("MIDSCENE_DRIVER_TAG") {
            self.harness.driver_tag = tag;
        }
        if let Some(ms) = env::var("MIDSCENE_NETWORK_IDLE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.harness.network_idle_timeout_ms = ms;
        }
        if let Some(language) = env::var("MIDSCENE_LANGUAGE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.planning.language = Some(language);
        }
        if let Ok(debug) = env::var("MIDSCENE_DEBUG") {
            self.planning.debug = debug == "true" || debug == "1";
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| HarnessError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = self.to_toml()?;

        fs::write(&config_path, content)
            .map_err(|e| HarnessError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| HarnessError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        Config::default()
            .to_toml()
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.harness.serialize_page_operations);
        assert!(config.harness.network_idle_timeout_ms > 0);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::from_toml(
            r#"
            [harness]
            driver_tag = "puppeteer"
            network_idle_timeout_ms = 500
            serialize_page_operations = false

            [planning]
            language = "Chinese"
            debug = true
            "#,
        )
        .unwrap();
        assert_eq!(config.harness.driver_tag, "puppeteer");
        assert_eq!(config.harness.network_idle_timeout(), Duration::from_millis(500));
        assert!(!config.harness.serialize_page_operations);
        assert_eq!(config.planning.language, Some(Language::Chinese));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = Config::from_toml("[harness]\ndriver_tag = \"webdriver\"\n").unwrap();
        assert_eq!(config.harness.driver_tag, "webdriver");
        assert!(config.harness.serialize_page_operations);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml("harness = 3").unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = Config::default_config_toml();
        assert!(toml_str.contains("network_idle_timeout_ms"));
        assert!(toml_str.contains("driver_tag"));
    }

    #[test]
    fn test_debug_lowers_log_level() {
        let config = Config::from_toml("[planning]\ndebug = true\n").unwrap();
        assert!(config.planning.debug);
        assert_eq!(config.default_log_level(), "debug");

        let config = Config::from_toml("[planning]\ndebug = false\n").unwrap();
        assert_eq!(config.default_log_level(), "warn");
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("midscene"));
    }
}
