//! Editor configuration
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats; the default location is the platform config directory.
//!
//! Configuration is organized into sections:
//! - Canvas defaults (raster size, fallback element sizes)
//! - Autosave cadence
//! - Camera pose and zoom limits
//! - Upload limits
//! - Fonts
//! - Design defaults (name, colour, texture area, fallback palette)

use atelier_core::constants::*;
use atelier_core::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{SettingsError, SettingsResult};

/// Raster defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    /// Raster width when no texture area is selected
    pub default_width: u32,
    /// Raster height when no texture area is selected
    pub default_height: u32,
    /// Drawn size of images without an explicit size
    pub default_image_size: f64,
    /// Drawn size of shapes without an explicit size
    pub default_shape_size: f64,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            default_width: DEFAULT_CANVAS_SIZE,
            default_height: DEFAULT_CANVAS_SIZE,
            default_image_size: DEFAULT_IMAGE_SIZE,
            default_shape_size: DEFAULT_SHAPE_SIZE,
        }
    }
}

/// Autosave settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveSettings {
    /// Whether the autosave timer runs at all
    pub enabled: bool,
    /// Seconds between autosave ticks
    pub interval_secs: u64,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
        }
    }
}

impl AutosaveSettings {
    /// Tick period
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Orbit camera pose and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Yaw in radians
    pub alpha: f32,
    /// Elevation in radians
    pub beta: f32,
    /// Distance from target
    pub radius: f32,
    /// Closest allowed distance
    pub min_radius: f32,
    /// Farthest allowed distance
    pub max_radius: f32,
    /// Distance change per zoom step
    pub zoom_step: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            alpha: CAMERA_DEFAULT_ALPHA,
            beta: CAMERA_DEFAULT_BETA,
            radius: CAMERA_DEFAULT_RADIUS,
            min_radius: CAMERA_MIN_RADIUS,
            max_radius: CAMERA_MAX_RADIUS,
            zoom_step: CAMERA_ZOOM_STEP,
        }
    }
}

/// Upload limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Largest accepted image file in bytes
    pub max_bytes: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

/// Font settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    /// Family given to new text elements
    pub default_family: String,
    /// Family used when a requested family is not installed
    pub fallback_family: String,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            default_family: "Inter".to_string(),
            fallback_family: "Sans".to_string(),
        }
    }
}

/// Defaults for a new design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignDefaults {
    /// Name of a new design
    pub name: String,
    /// Product colour before the user picks one
    pub color: String,
    /// Texture area chosen when the product has one with this id
    pub texture_area: String,
    /// Colours offered when the product lists none
    pub fallback_palette: Vec<String>,
}

impl Default for DesignDefaults {
    fn default() -> Self {
        Self {
            name: DEFAULT_DESIGN_NAME.to_string(),
            color: DEFAULT_PRODUCT_COLOR.to_string(),
            texture_area: DEFAULT_TEXTURE_AREA.to_string(),
            fallback_palette: FALLBACK_COLORS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Complete editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EditorConfig {
    /// Raster defaults
    pub canvas: CanvasSettings,
    /// Autosave cadence
    pub autosave: AutosaveSettings,
    /// Camera pose and limits
    pub camera: CameraSettings,
    /// Upload limits
    pub upload: UploadSettings,
    /// Fonts
    pub fonts: FontSettings,
    /// Design defaults
    pub design: DesignDefaults,
}

impl EditorConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location: `<config dir>/atelier/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("atelier").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no platform config directory".to_string())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = match extension(path).as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        config.validate()?;
        tracing::debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Load config from file, or return defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match extension(path).as_deref() {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.canvas.default_width == 0 || self.canvas.default_height == 0 {
            return Err(SettingsError::invalid(
                "canvas.default_width",
                "canvas dimensions must be > 0",
            ));
        }

        if self.canvas.default_image_size <= 0.0 || self.canvas.default_shape_size <= 0.0 {
            return Err(SettingsError::invalid(
                "canvas.default_image_size",
                "fallback element sizes must be > 0",
            ));
        }

        if self.autosave.interval_secs == 0 {
            return Err(SettingsError::invalid(
                "autosave.interval_secs",
                "must be > 0",
            ));
        }

        let camera = &self.camera;
        if camera.min_radius <= 0.0 {
            return Err(SettingsError::invalid("camera.min_radius", "must be > 0"));
        }
        if camera.min_radius > camera.max_radius {
            return Err(SettingsError::invalid(
                "camera.max_radius",
                "must not be below min_radius",
            ));
        }
        if camera.radius < camera.min_radius || camera.radius > camera.max_radius {
            return Err(SettingsError::invalid(
                "camera.radius",
                "default radius must lie within [min_radius, max_radius]",
            ));
        }
        if camera.zoom_step <= 0.0 {
            return Err(SettingsError::invalid("camera.zoom_step", "must be > 0"));
        }

        if self.upload.max_bytes == 0 {
            return Err(SettingsError::invalid("upload.max_bytes", "must be > 0"));
        }

        if self.fonts.default_family.trim().is_empty() {
            return Err(SettingsError::invalid(
                "fonts.default_family",
                "must not be empty",
            ));
        }

        Color::parse_hex(&self.design.color)
            .map_err(|e| SettingsError::invalid("design.color", e.to_string()))?;
        for entry in &self.design.fallback_palette {
            Color::parse_hex(entry)
                .map_err(|e| SettingsError::invalid("design.fallback_palette", e.to_string()))?;
        }
        if self.design.fallback_palette.is_empty() {
            return Err(SettingsError::invalid(
                "design.fallback_palette",
                "must list at least one colour",
            ));
        }

        Ok(())
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
