// Configuration module for loading and validating client configuration

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod client_config;

pub use client_config::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration manager backed by a single TOML file
pub struct ConfigManager {
    config_path: PathBuf,
    config: ClientConfig,
    loaded: bool,
}

impl ConfigManager {
    /// Create new configuration manager with default path
    pub fn new() -> Self {
        Self::with_path("panel_relay.toml")
    }

    /// Create configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
            config: ClientConfig::default(),
            loaded: false,
        }
    }

    /// Load and validate the configuration file
    pub fn load(&mut self) -> Result<(), ConfigError> {
        let content = fs::read_to_string(&self.config_path)
            .map_err(|_| ConfigError::FileNotFound(self.config_path.display().to_string()))?;
        let config = parse_config(&content)?;
        self.config = config;
        self.loaded = true;
        Ok(())
    }

    /// Load with fallback to defaults if the file is missing or invalid
    pub fn load_or_default(&mut self) -> &Self {
        if let Err(e) = self.load() {
            log::warn!("Failed to load config, using defaults: {}", e);
            self.config = ClientConfig::default();
            self.loaded = true;
        }
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    /// Save current configuration
    pub fn save(&self) -> Result<(), ConfigError> {
        let toml_str =
            toml::to_string_pretty(&self.config).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.config_path, toml_str)?;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn reload(&mut self) -> Result<(), ConfigError> {
        self.loaded = false;
        self.load()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a TOML document and validate it
pub fn parse_config(content: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Validate value ranges that serde cannot express
pub fn validate(config: &ClientConfig) -> Result<(), ConfigError> {
    let url = url::Url::parse(&config.server.url)
        .map_err(|e| ConfigError::Invalid(format!("server.url '{}': {}", config.server.url, e)))?;
    if !matches!(url.scheme(), "ws" | "wss" | "http" | "https") {
        return Err(ConfigError::Invalid(format!(
            "server.url must use ws, wss, http or https, got '{}'",
            url.scheme()
        )));
    }
    if config.display.default_image_format.trim().is_empty() {
        return Err(ConfigError::Invalid("display.default_image_format is empty".to_string()));
    }
    if config.gesture.num_hands == 0 {
        return Err(ConfigError::Invalid("gesture.num_hands must be at least 1".to_string()));
    }
    if config.gesture.label_font_size <= 0.0 {
        return Err(ConfigError::Invalid("gesture.label_font_size must be positive".to_string()));
    }
    Ok(())
}
