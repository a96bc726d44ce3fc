//! Error types for settings persistence.

use thiserror::Error;

/// Errors raised while loading or saving planner settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse or write failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse failure.
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML write failure.
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Settings parsed but failed validation.
    #[error("Invalid settings: {0}")]
    Invalid(String),

    /// File extension is neither `json` nor `toml`.
    #[error("Unsupported settings format: {0}")]
    UnsupportedFormat(String),

    /// No user config directory could be resolved.
    #[error("Config directory error: {0}")]
    ConfigDirectory(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;
