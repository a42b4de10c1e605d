use crate::global;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Environment variable carrying the Gemini API key.
///
/// The key is deliberately never stored in the config file, so the file can
/// be shared or committed without leaking credentials.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub minutes: MinutesConfig,
    pub behavior: BehaviorConfig,
    pub ui: UiConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Pipeline sample rate for the mixed recording.
    pub sample_rate: u32,
    /// Voice gate sensitivity, 1-50. Peak magnitudes above `sensitivity * 2`
    /// (on the 0-255 analyser scale) count as speech.
    pub sensitivity: u8,
    /// Whether the microphone starts manually enabled.
    pub mic_enabled: bool,
    /// Pump tick interval in milliseconds.
    pub tick_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            sensitivity: 15,
            mic_enabled: true,
            tick_ms: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinutesConfig {
    /// Gemini model used for minutes generation.
    pub model: String,
    /// Base endpoint of the generative language API.
    pub endpoint: String,
}

impl Default for MinutesConfig {
    fn default() -> Self {
        Self {
            model: "gemini-3-flash-preview".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Copy the plain-text minutes to the clipboard once generated.
    pub copy_to_clipboard: bool,
    /// Keep the mixed recording on disk after a session completes.
    pub keep_recordings: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            copy_to_clipboard: true,
            keep_recordings: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Render the live spectrum meter to the terminal while recording.
    pub visualizer: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { visualizer: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 6660 } // MOM on a phone keypad, plus a trailing zero
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

/// Read the Gemini API key from the environment.
///
/// Absence is a fatal startup condition for anything that talks to the
/// minutes API.
pub fn api_key_from_env() -> Result<String> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!(
            "{} is not set. Export your Gemini API key before starting momsync.",
            API_KEY_ENV
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capture_config() {
        let config = CaptureConfig::default();
        assert_eq!(config.sample_rate, 16_000);
        assert_eq!(config.sensitivity, 15);
        assert!(config.mic_enabled);
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.capture.sensitivity, config.capture.sensitivity);
        assert_eq!(parsed.minutes.model, config.minutes.model);
        assert_eq!(parsed.api.port, config.api.port);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str("[capture]\nsensitivity = 30\n").unwrap();
        assert_eq!(parsed.capture.sensitivity, 30);
        assert_eq!(parsed.capture.sample_rate, 16_000);
        assert!(parsed.behavior.copy_to_clipboard);
    }
}
