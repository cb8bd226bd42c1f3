//! Configuration module for loading TOML config files.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::DebateError;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Debate server connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
        }
    }
}

/// Turn playback settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// Advance turns automatically instead of waiting for input.
    pub auto_play: bool,
    /// Pause between consecutive turns in auto-play, in milliseconds.
    pub turn_delay_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            auto_play: true,
            turn_delay_ms: 500,
        }
    }
}

impl PlaybackConfig {
    pub fn turn_delay(&self) -> Duration {
        Duration::from_millis(self.turn_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DebateError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DebateError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_str(&content)
    }

    /// Load configuration from string content.
    pub fn from_str(content: &str) -> Result<Self, DebateError> {
        toml::from_str(content)
            .map_err(|e| DebateError::Config(format!("Failed to parse config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://localhost:8000");
        assert!(config.playback.auto_play);
        assert_eq!(config.playback.turn_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_str(
            r#"
            [server]
            url = "http://192.168.0.2:8000"

            [playback]
            auto_play = false
            turn_delay_ms = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.server.url, "http://192.168.0.2:8000");
        assert!(!config.playback.auto_play);
        assert_eq!(config.playback.turn_delay_ms, 1000);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config = Config::from_str("[server]\nurl = \"http://example.com\"\n").unwrap();
        assert_eq!(config.server.url, "http://example.com");
        assert!(config.playback.auto_play);
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        assert!(matches!(
            Config::from_str("server = nonsense"),
            Err(DebateError::Config(_))
        ));
    }
}
