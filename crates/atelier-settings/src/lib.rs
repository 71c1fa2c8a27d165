//! Atelier Settings Crate
//!
//! Editor configuration: canvas defaults, autosave cadence, camera limits,
//! upload limits, fonts and design defaults.

pub mod config;
pub mod error;

pub use config::{
    AutosaveSettings, CameraSettings, CanvasSettings, DesignDefaults, EditorConfig, FontSettings,
    UploadSettings,
};
pub use error::{SettingsError, SettingsResult};
