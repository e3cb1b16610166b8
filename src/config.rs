use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub backend: BackendConfig,
    pub chat: ChatConfig,
}

/// Audio capture and voice activity detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub speech_threshold: f32,
    pub trailing_silence_ms: u32,
    pub initial_grace_ms: u32,
}

/// Chat backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
}

/// Conversation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub auto_rearm: bool,
    pub rearm_delay_ms: u64,
    pub no_speech_rearm_delay_ms: u64,
    pub text_reveal_interval_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            speech_threshold: defaults::SPEECH_THRESHOLD,
            trailing_silence_ms: defaults::TRAILING_SILENCE_MS,
            initial_grace_ms: defaults::INITIAL_GRACE_MS,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: defaults::BACKEND_URL.to_string(),
            timeout_secs: defaults::BACKEND_TIMEOUT_SECS,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            auto_rearm: true,
            rearm_delay_ms: defaults::REARM_DELAY_MS,
            no_speech_rearm_delay_ms: defaults::NO_SPEECH_REARM_DELAY_MS,
            text_reveal_interval_ms: defaults::TEXT_REVEAL_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e.context(format!("Failed to load config from {}", path.display())))
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXCHAT_SERVER → backend.url
    /// - VOXCHAT_AUDIO_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("VOXCHAT_SERVER")
            && !url.is_empty()
        {
            self.backend.url = url;
        }

        if let Ok(device) = std::env::var("VOXCHAT_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxchat/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("voxchat")
            .join("config.toml")
    }
}
