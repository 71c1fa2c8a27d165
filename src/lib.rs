//! # Atelier
//!
//! Design composition and texture projection for a print-on-demand 3D
//! product editor. Users place text, images and shapes on a 2D canvas; the
//! canvas is rasterised into a texture and projected onto the product model.
//!
//! ## Architecture
//!
//! 1. **atelier-core** - errors, event bus, colours, geometry, identifiers
//! 2. **atelier-settings** - editor configuration
//! 3. **atelier-designer** - element model, layer stack, compositor, persistence
//! 4. **atelier-viewport** - orbit camera, scene, product mesh, live texture
//! 5. **atelier** - headless preview CLI tying the crates together

pub mod preview;

pub use atelier_core::{Color, DesignId, EditorEvent, ElementId, Error, EventBus, Result};
pub use atelier_designer as designer;
pub use atelier_designer::{
    DesignDocument, DesignElement, EditorSession, Product, TextureFrame, Visibility,
};
pub use atelier_settings::EditorConfig;
pub use atelier_viewport as viewport;
pub use atelier_viewport::{HeadlessBackend, ViewportController};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging at `info`, overridable through `RUST_LOG`
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with_level(tracing::Level::INFO)
}

/// Initialize logging with `level` as the default directive
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging_with_level(level: tracing::Level) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;

    Ok(())
}
