//! Headless preview pipeline used by the CLI.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use atelier_core::{Color, EventBus, EventBusConfig};
use atelier_designer::{DesignDocument, EditorSession, Product, TextureFrame};
use atelier_settings::EditorConfig;
use atelier_viewport::{HeadlessBackend, ViewportController};
use image::RgbaImage;
use tracing::{info, warn};

/// Result of rendering one design
pub struct Preview {
    /// `None` when the design has no elements
    pub frame: Option<TextureFrame>,
    /// Atlas bake, when requested
    pub atlas: Option<RgbaImage>,
}

pub fn load_product(path: &Path) -> Result<Product> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read product {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse product {}", path.display()))
}

/// Rebuild `document` on `product` and rasterise it
///
/// With `bake` the frame also goes through a headless viewport and the
/// product atlas is baked with the design's colour.
pub fn render_preview(
    product: Product,
    document: &DesignDocument,
    config: EditorConfig,
    bake: bool,
) -> Result<Preview> {
    let events = Arc::new(EventBus::with_config(EventBusConfig::default()));
    let camera = config.camera.clone();
    let mut session = EditorSession::open_with_event_bus(product, config, events.clone());
    session
        .load_document(document)
        .context("Design does not fit the product")?;

    let frame = session.render_blocking();
    match &frame {
        Some(f) => info!("Rendered {}x{} texture", f.width, f.height),
        None => warn!("Design has no elements, nothing rendered"),
    }

    let atlas = if bake {
        let mut viewport = ViewportController::with_event_bus(HeadlessBackend::new(), &camera, events);
        viewport.load(Path::new(&session.product().model_path))?;
        let color = Color::parse_hex(session.product_color())
            .map_err(|e| anyhow!("Invalid product colour: {}", e))?;
        viewport.apply_color(color)?;
        if let Some(frame) = &frame {
            viewport.publish_texture(frame)?;
        }
        let area = session
            .texture_area()
            .ok_or_else(|| anyhow!("Product has no texture areas"))?;
        let atlas = viewport
            .backend()
            .bake(session.product(), area, viewport.material());
        viewport.dispose()?;
        atlas
    } else {
        None
    };

    Ok(Preview { frame, atlas })
}

/// Element counts by kind after loading `document` into a layer stack
pub fn validate_document(document: &DesignDocument) -> Result<BTreeMap<String, usize>> {
    let stack = document.to_stack().context("Design is not a valid layer stack")?;
    let mut counts = BTreeMap::new();
    for element in stack.elements() {
        *counts.entry(element.kind().to_string()).or_insert(0) += 1;
    }
    Ok(counts)
}
