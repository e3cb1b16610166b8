//! Error types for voxchat.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxchatError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    #[error("Audio encoding failed: {message}")]
    AudioEncode { message: String },

    // Playback errors
    #[error("Audio playback failed: {message}")]
    Playback { message: String },

    // Backend errors, one per turn stage
    #[error("Upload failed: {message}")]
    Upload { message: String },

    #[error("Processing failed: {message}")]
    Processing { message: String },

    #[error("Audio streaming failed: {message}")]
    Synthesis { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxchatError>;

impl VoxchatError {
    /// Short banner text for this error, matching what the conversation
    /// view shows when a turn is aborted.
    pub fn banner_text(&self) -> String {
        match self {
            VoxchatError::Upload { message }
            | VoxchatError::Processing { message }
            | VoxchatError::Synthesis { message } => format!("Error: {message}"),
            VoxchatError::AudioDeviceNotFound { .. } | VoxchatError::AudioCapture { .. } => {
                "Microphone access denied".to_string()
            }
            VoxchatError::Playback { .. } => "Audio playback failed".to_string(),
            other => format!("Error: {other}"),
        }
    }
}
