//! Settings errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    /// A value failed validation; `key` is the dotted path, e.g. `camera.min_radius`
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// File extension other than `toml` or `json`
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Cannot locate config directory: {0}")]
    ConfigDirectory(String),

    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed TOML config: {0}")]
    TomlRead(#[from] toml::de::Error),

    #[error("Cannot write TOML config: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

impl SettingsError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        SettingsError::InvalidSetting {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the file was readable but its contents were rejected
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            SettingsError::InvalidSetting { .. }
                | SettingsError::Json(_)
                | SettingsError::TomlRead(_)
        )
    }
}

pub type SettingsResult<T> = Result<T, SettingsError>;
