//! Editor session.
//!
//! One open product in the editor: the layer stack, the compositor that
//! turns it into a texture, and the product options the user picked. The
//! shell drives the session from its UI thread; image decodes and autosave
//! run beside it on tokio.

use std::sync::Arc;

use atelier_core::{
    event_bus, Color, DesignEvent, DesignId, EditorEvent, ElementId, Error, EventBus, LayerError,
    Result, ThreadSafeRw,
};
use atelier_settings::EditorConfig;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::compositor::{CompletionOutcome, Compositor, PassStart, TextureFrame, TextureSink};
use crate::decoding::{DecodeCompletion, ImageDecoder};
use crate::layer_stack::{LayerInfo, LayerStack};
use crate::model::{encode_upload, DesignElement, ElementPatch, ShapeKind};
use crate::renderer::RenderOptions;
use crate::serialization::{DesignDocument, Visibility};
use crate::texture_area::{Product, TextureArea, TextureAreaRegistry};

/// Text a new text element starts with
pub const NEW_TEXT_CONTENT: &str = "Nouveau texte";

/// Shared handle to whatever displays the texture
pub type SharedTextureSink = Arc<parking_lot::Mutex<dyn TextureSink>>;

/// State of one open design
pub struct EditorSession {
    config: EditorConfig,
    registry: TextureAreaRegistry,
    layers: LayerStack,
    compositor: Compositor,
    product_color: String,
    texture_area_id: String,
    name: String,
    design_id: Option<DesignId>,
    /// Layer revision and area of the last pass
    rendered: Option<(u64, String)>,
    sink: Option<SharedTextureSink>,
    decoder: Option<ImageDecoder>,
    events: Arc<EventBus>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("product", &self.registry.product().id)
            .field("elements", &self.layers.len())
            .field("product_color", &self.product_color)
            .field("texture_area_id", &self.texture_area_id)
            .field("design_id", &self.design_id)
            .finish()
    }
}

impl EditorSession {
    /// Open a new, empty design for `product`
    pub fn open(product: Product, config: EditorConfig) -> Self {
        Self::open_with_event_bus(product, config, event_bus())
    }

    pub fn open_with_event_bus(product: Product, config: EditorConfig, events: Arc<EventBus>) -> Self {
        let registry = TextureAreaRegistry::new(product);
        let texture_area_id = registry
            .resolve(&config.design.texture_area)
            .map(|a| a.id.clone())
            .unwrap_or_else(|| config.design.texture_area.clone());
        let compositor =
            Compositor::with_event_bus(RenderOptions::from(&config), events.clone());
        info!(
            "Opened product {} on area {}",
            registry.product().id,
            texture_area_id
        );

        Self {
            product_color: config.design.color.clone(),
            name: config.design.name.clone(),
            config,
            registry,
            layers: LayerStack::new(),
            compositor,
            texture_area_id,
            design_id: None,
            rendered: None,
            sink: None,
            decoder: None,
            events,
        }
    }

    fn emit(&self, event: DesignEvent) {
        let _ = self.events.publish(EditorEvent::Design(event));
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn product(&self) -> &Product {
        self.registry.product()
    }

    pub fn registry(&self) -> &TextureAreaRegistry {
        &self.registry
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// Layer panel rows, top-most first
    pub fn layer_panel(&self) -> Vec<LayerInfo> {
        self.layers.layers()
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn product_color(&self) -> &str {
        &self.product_color
    }

    pub fn texture_area_id(&self) -> &str {
        &self.texture_area_id
    }

    pub fn texture_area(&self) -> Option<&TextureArea> {
        self.registry.get(&self.texture_area_id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Identifier assigned by the store on the first save
    pub fn design_id(&self) -> Option<&DesignId> {
        self.design_id.as_ref()
    }

    pub fn set_design_id(&mut self, id: Option<DesignId>) {
        self.design_id = id;
    }

    /// Raster size of the selected texture area
    pub fn canvas_size(&self) -> (u32, u32) {
        self.registry.canvas_size_for(
            &self.texture_area_id,
            (
                self.config.canvas.default_width,
                self.config.canvas.default_height,
            ),
        )
    }

    /// Route published frames to `sink`
    pub fn attach_sink(&mut self, sink: SharedTextureSink) {
        self.sink = Some(sink);
    }

    pub fn detach_sink(&mut self) -> Option<SharedTextureSink> {
        self.sink.take()
    }

    /// Decode images in the background instead of on the caller's thread
    pub fn attach_decoder(&mut self, decoder: ImageDecoder) {
        self.decoder = Some(decoder);
    }

    fn next_z(&mut self) -> i32 {
        self.layers.next_top_z()
    }

    fn add_on_top(&mut self, element: DesignElement) -> Result<ElementId> {
        let z = self.next_z();
        let id = self.layers.add(element.with_z(z))?;
        self.emit(DesignEvent::ElementAdded { id: id.clone() });
        self.emit(DesignEvent::SelectionChanged {
            id: Some(id.clone()),
        });
        Ok(id)
    }

    /// Add a text element in the configured default font
    pub fn add_text(&mut self, content: Option<&str>) -> Result<ElementId> {
        let element = DesignElement::text(
            content.unwrap_or(NEW_TEXT_CONTENT),
            self.config.fonts.default_family.clone(),
        );
        self.add_on_top(element)
    }

    pub fn add_shape(&mut self, kind: ShapeKind) -> Result<ElementId> {
        self.add_on_top(DesignElement::shape(kind))
    }

    /// Add an image from an already encoded payload
    pub fn add_image(&mut self, image_data: impl Into<String>) -> Result<ElementId> {
        self.add_on_top(DesignElement::image(image_data))
    }

    /// Validate an uploaded file and add it as an image element
    pub fn add_image_upload(&mut self, mime: &str, bytes: &[u8]) -> Result<ElementId> {
        let payload = encode_upload(mime, bytes, self.config.upload.max_bytes)?;
        self.add_image(payload)
    }

    /// Add an element built by the caller, keeping its z-index
    pub fn add_element(&mut self, element: DesignElement) -> Result<ElementId> {
        let id = self.layers.add(element)?;
        self.emit(DesignEvent::ElementAdded { id: id.clone() });
        Ok(id)
    }

    pub fn update(&mut self, id: &ElementId, patch: &ElementPatch) -> Result<()> {
        let before = self.layers.revision();
        self.layers.update(id, patch)?;
        if self.layers.revision() != before {
            self.emit(DesignEvent::ElementUpdated { id: id.clone() });
        }
        Ok(())
    }

    pub fn move_by(&mut self, id: &ElementId, dx: f64, dy: f64) -> Result<()> {
        self.layers.move_by(id, dx, dy)?;
        self.emit(DesignEvent::ElementUpdated { id: id.clone() });
        Ok(())
    }

    /// Delete an element; unknown ids are ignored
    pub fn remove(&mut self, id: &ElementId) -> Option<DesignElement> {
        let removed = self.layers.remove(id)?;
        self.emit(DesignEvent::ElementRemoved { id: id.clone() });
        Some(removed)
    }

    pub fn reorder_to_top(&mut self, id: &ElementId) -> Result<i32> {
        let z_index = self.layers.reorder_to_top(id)?;
        self.emit(DesignEvent::ElementReordered {
            id: id.clone(),
            z_index,
        });
        Ok(z_index)
    }

    pub fn reorder_to_bottom(&mut self, id: &ElementId) -> Result<i32> {
        let z_index = self.layers.reorder_to_bottom(id)?;
        self.emit(DesignEvent::ElementReordered {
            id: id.clone(),
            z_index,
        });
        Ok(z_index)
    }

    pub fn toggle_visibility(&mut self, id: &ElementId) -> Result<bool> {
        let visible = self.layers.toggle_visibility(id)?;
        self.emit(DesignEvent::ElementUpdated { id: id.clone() });
        Ok(visible)
    }

    pub fn toggle_lock(&mut self, id: &ElementId) -> Result<bool> {
        let locked = self.layers.toggle_lock(id)?;
        self.emit(DesignEvent::ElementUpdated { id: id.clone() });
        Ok(locked)
    }

    /// Select an element or clear the selection
    pub fn select(&mut self, id: Option<&ElementId>) -> Option<ElementId> {
        let selected = self.layers.set_selection(id).cloned();
        self.emit(DesignEvent::SelectionChanged {
            id: selected.clone(),
        });
        selected
    }

    /// Colours the user may pick for this product
    pub fn available_colors(&self) -> &[String] {
        let listed = &self.registry.product().available_colors;
        if listed.is_empty() {
            &self.config.design.fallback_palette
        } else {
            listed
        }
    }

    /// Pick the product base colour
    ///
    /// The colour must be one the product offers (or the fallback palette
    /// when it lists none). The design texture is unaffected.
    pub fn set_color(&mut self, color: &str) -> Result<()> {
        let wanted = Color::parse_hex(color).map_err(|e| LayerError::InvalidAttribute {
            field: "productColor".to_string(),
            reason: e.to_string(),
        })?;
        let offered = self
            .available_colors()
            .iter()
            .any(|c| Color::parse_hex(c).is_ok_and(|c| c == wanted));
        if !offered {
            return Err(LayerError::InvalidAttribute {
                field: "productColor".to_string(),
                reason: format!("{} is not offered for this product", color),
            }
            .into());
        }
        if self.product_color != color {
            self.product_color = color.to_string();
            self.emit(DesignEvent::ColorChanged {
                color: color.to_string(),
            });
        }
        Ok(())
    }

    /// Switch the texture area the design is printed on
    pub fn select_texture_area(&mut self, area_id: &str) -> Result<()> {
        if self.registry.get(area_id).is_none() {
            return Err(LayerError::InvalidAttribute {
                field: "textureAreaId".to_string(),
                reason: format!("product has no area '{}'", area_id),
            }
            .into());
        }
        if self.texture_area_id != area_id {
            self.texture_area_id = area_id.to_string();
            self.emit(DesignEvent::TextureAreaChanged {
                area_id: area_id.to_string(),
            });
        }
        Ok(())
    }

    /// Whether the stack or area changed since the last pass started
    pub fn needs_render(&self) -> bool {
        self.rendered.as_ref()
            != Some(&(self.layers.revision(), self.texture_area_id.clone()))
    }

    fn publish(&self, frame: Option<&TextureFrame>) {
        let Some(sink) = &self.sink else {
            return;
        };
        let mut sink = sink.lock();
        match frame {
            Some(frame) => sink.publish(frame),
            None => sink.clear(),
        }
    }

    /// Start a compositor pass over the current stack
    ///
    /// Immediate results go to the attached sink. Pending decodes are handed
    /// to the attached decoder; without one the caller must run them and feed
    /// the completions to [`EditorSession::complete_decode`].
    pub fn start_render(&mut self) -> PassStart {
        let canvas = self.canvas_size();
        self.rendered = Some((self.layers.revision(), self.texture_area_id.clone()));
        let start = self.compositor.begin_pass(self.layers.elements(), canvas);
        match &start {
            PassStart::NoTexture { .. } => self.publish(None),
            PassStart::Ready(frame) => self.publish(Some(frame)),
            PassStart::Pending { requests, .. } => {
                if let Some(decoder) = &self.decoder {
                    decoder.dispatch(requests.clone());
                }
            }
        }
        start
    }

    /// Feed back one decode result
    pub fn complete_decode(&mut self, completion: DecodeCompletion) -> CompletionOutcome {
        let outcome = self.compositor.complete_decode(completion);
        if let CompletionOutcome::Ready(frame) = &outcome {
            self.publish(Some(frame));
        }
        outcome
    }

    /// Run a whole pass on this thread, publishing the result
    pub fn render_blocking(&mut self) -> Option<TextureFrame> {
        let canvas = self.canvas_size();
        self.rendered = Some((self.layers.revision(), self.texture_area_id.clone()));
        let frame = self
            .compositor
            .render_blocking(self.layers.elements(), canvas);
        self.publish(frame.as_ref());
        frame
    }

    /// Snapshot the design for the persistence layer
    pub fn to_document(&self, visibility: Visibility) -> DesignDocument {
        DesignDocument::from_stack(
            self.registry.product().id.clone(),
            self.name.clone(),
            self.product_color.clone(),
            self.texture_area_id.clone(),
            &self.layers,
            visibility,
        )
    }

    /// Replace the current design with a stored one
    ///
    /// Unknown texture areas fall back to the product's first area. Colours
    /// the product no longer offers are kept, with a warning.
    pub fn load_document(&mut self, document: &DesignDocument) -> Result<()> {
        if document.product_id != self.registry.product().id {
            warn!(
                "Design for product {} opened on {}",
                document.product_id,
                self.registry.product().id
            );
        }
        let layers = document.to_stack()?;

        let area = self
            .registry
            .resolve(&document.texture_area_id)
            .map(|a| a.id.clone())
            .unwrap_or_else(|| document.texture_area_id.clone());
        if area != document.texture_area_id {
            warn!(
                "Unknown texture area '{}', using '{}'",
                document.texture_area_id, area
            );
        }
        if Color::parse_hex(&document.product_color).is_err() {
            return Err(Error::Layer(LayerError::InvalidAttribute {
                field: "productColor".to_string(),
                reason: format!("'{}' is not a colour", document.product_color),
            }));
        }

        self.layers = layers;
        self.texture_area_id = area;
        self.product_color = document.product_color.clone();
        self.name = document.name.clone();
        self.rendered = None;
        debug!("Loaded design with {} elements", self.layers.len());
        self.emit(DesignEvent::DesignLoaded {
            elements: self.layers.len(),
        });
        Ok(())
    }
}

/// Feed background decode completions into a shared session
///
/// Runs until the decoder side of the channel is dropped.
pub fn spawn_decode_pump(
    session: ThreadSafeRw<EditorSession>,
    mut completions: mpsc::UnboundedReceiver<DecodeCompletion>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(completion) = completions.recv().await {
            let outcome = session.write().complete_decode(completion);
            if let CompletionOutcome::Ready(frame) = outcome {
                debug!("Background pass {} published", frame.generation);
            }
        }
        debug!("Decode pump stopped");
    })
}
