// Client-wide configuration structures
// Every section has defaults so a partial TOML file is enough

use serde::{Deserialize, Serialize};

use crate::core::Locale;

/// Main client configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub display: DisplayConfig,
    pub gesture: GestureConfig,
    pub logging: LoggingConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub url: String,
    pub socketio_path: String,
    pub reconnect_delay_ms: u64,
    pub max_reconnect_attempts: u32,
    pub connect_timeout_ms: u64,
}

/// Execution session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay of the single re-check after a start() issued while disconnected
    pub start_retry_delay_ms: u64,
}

/// Widget display configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub default_image_format: String,
    pub locale: Locale,
    pub console_capacity: usize,
    pub resource_history_capacity: usize,
}

/// Hand gesture recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GestureConfig {
    pub num_hands: usize,
    pub runtime_path: String,
    pub model_asset_path: String,
    pub label_font_path: Option<String>,
    pub label_font_size: f32,
    pub connection_line_width: f32,
    pub landmark_radius: f32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:5000".to_string(),
            socketio_path: "/socket.io/".to_string(),
            reconnect_delay_ms: 1000,
            max_reconnect_attempts: 5,
            connect_timeout_ms: 10000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_retry_delay_ms: 2000,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_image_format: "jpeg".to_string(),
            locale: Locale::En,
            console_capacity: 1000,
            resource_history_capacity: 256,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            num_hands: 2,
            runtime_path: "https://cdn.jsdelivr.net/npm/@mediapipe/tasks-vision@0.10.0/wasm".to_string(),
            model_asset_path: "https://storage.googleapis.com/mediapipe-models/gesture_recognizer/gesture_recognizer/float16/1/gesture_recognizer.task".to_string(),
            label_font_path: None,
            label_font_size: 20.0,
            connection_line_width: 5.0,
            landmark_radius: 2.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

// Builder pattern for fluent configuration

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }
}

pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server.url = url.into();
        self
    }

    pub fn reconnect(mut self, delay_ms: u64, max_attempts: u32) -> Self {
        self.config.server.reconnect_delay_ms = delay_ms;
        self.config.server.max_reconnect_attempts = max_attempts;
        self
    }

    pub fn start_retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.session.start_retry_delay_ms = delay_ms;
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.display.locale = locale;
        self
    }

    pub fn default_image_format(mut self, format: impl Into<String>) -> Self {
        self.config.display.default_image_format = format.into();
        self
    }

    pub fn gesture(mut self, gesture: GestureConfig) -> Self {
        self.config.gesture = gesture;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
