//! Editor-wide constants.
//!
//! These are the built-in defaults; most of them can be overridden through
//! `atelier-settings`.

use std::f32::consts::PI;

/// Side of the square raster used when no texture area is selected
pub const DEFAULT_CANVAS_SIZE: u32 = 2048;

/// Drawn size of an image element that has no explicit size
pub const DEFAULT_IMAGE_SIZE: f64 = 300.0;

/// Drawn size of a shape element that has no explicit size
pub const DEFAULT_SHAPE_SIZE: f64 = 100.0;

/// Font size used when a text element is created without one
pub const DEFAULT_FONT_SIZE: f64 = 32.0;

/// Characters of text content shown in the layer panel
pub const LAYER_LABEL_MAX_CHARS: usize = 20;

/// Autosave period in seconds
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Largest accepted image upload (5 MiB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Product colour when none has been picked
pub const DEFAULT_PRODUCT_COLOR: &str = "#ffffff";

/// Texture area used when a product does not say otherwise
pub const DEFAULT_TEXTURE_AREA: &str = "front";

/// Name given to a new design
pub const DEFAULT_DESIGN_NAME: &str = "Mon Design";

/// Palette offered when a product lists no colours
pub const FALLBACK_COLORS: [&str; 5] = ["#ffffff", "#000000", "#ef4444", "#3b82f6", "#10b981"];

/// Default camera yaw in radians
pub const CAMERA_DEFAULT_ALPHA: f32 = -PI / 2.0;

/// Default camera elevation in radians
pub const CAMERA_DEFAULT_BETA: f32 = PI / 2.5;

/// Default camera distance from the target
pub const CAMERA_DEFAULT_RADIUS: f32 = 4.0;

/// Closest allowed camera distance
pub const CAMERA_MIN_RADIUS: f32 = 2.0;

/// Farthest allowed camera distance
pub const CAMERA_MAX_RADIUS: f32 = 10.0;

/// Distance change per zoom step
pub const CAMERA_ZOOM_STEP: f32 = 0.5;
