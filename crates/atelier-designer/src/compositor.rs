//! Canvas compositor.
//!
//! Turns the layer stack into the texture raster shown on the product. A
//! pass paints synchronously when every image it needs is already decoded;
//! otherwise it hands out decode requests and paints once the last one
//! completes. Starting a new pass supersedes any pass still waiting, and
//! completions addressed to a superseded pass are ignored.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use atelier_core::{event_bus, EditorEvent, ElementId, EventBus, RenderEvent};
use tiny_skia::Pixmap;
use tracing::{debug, info, warn};

use crate::decoding::{payload_fingerprint, DecodeCompletion, DecodeRequest, DecodedImage};
use crate::layer_stack::paint_order;
use crate::model::DesignElement;
use crate::renderer::{paint_elements, RenderOptions};

/// Finished texture raster, straight (non-premultiplied) RGBA8
#[derive(Debug, Clone, PartialEq)]
pub struct TextureFrame {
    pub width: u32,
    pub height: u32,
    /// Pass that produced the frame
    pub generation: u64,
    pixels: Vec<u8>,
}

impl TextureFrame {
    pub(crate) fn from_pixmap(pixmap: &Pixmap, generation: u64) -> Self {
        let mut pixels = Vec::with_capacity(pixmap.data().len());
        for px in pixmap.pixels() {
            let c = px.demultiply();
            pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Self {
            width: pixmap.width(),
            height: pixmap.height(),
            generation,
            pixels,
        }
    }

    /// Raw RGBA bytes, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixel(x, y).map(|p| p[3]).unwrap_or(0)
    }

    /// True when no pixel has any coverage
    pub fn is_transparent(&self) -> bool {
        self.pixels.chunks_exact(4).all(|p| p[3] == 0)
    }

    /// Inclusive bounds `(min_x, min_y, max_x, max_y)` of non-transparent pixels
    pub fn ink_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (i, p) in self.pixels.chunks_exact(4).enumerate() {
            if p[3] == 0 {
                continue;
            }
            let x = (i % self.width as usize) as u32;
            let y = (i / self.width as usize) as u32;
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        bounds
    }

    /// Whether both frames hold the same raster, ignoring generation
    pub fn same_pixels(&self, other: &TextureFrame) -> bool {
        self.width == other.width && self.height == other.height && self.pixels == other.pixels
    }

    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Write the frame as a PNG file
    pub fn save_png(&self, path: &Path) -> anyhow::Result<()> {
        let image = self
            .to_rgba_image()
            .context("texture frame has inconsistent dimensions")?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write texture to {}", path.display()))
    }
}

/// Receiver of compositor output, typically the 3D viewport
pub trait TextureSink: Send {
    /// Show `frame` on the product
    fn publish(&mut self, frame: &TextureFrame);

    /// Remove the design texture from the product
    fn clear(&mut self);
}

/// Outcome of starting a pass
#[derive(Debug, Clone)]
pub enum PassStart {
    /// Nothing to draw; any shown texture should be removed
    NoTexture { generation: u64 },
    /// Every input was available and the pass painted immediately
    Ready(TextureFrame),
    /// The pass waits for these decodes
    Pending {
        generation: u64,
        requests: Vec<DecodeRequest>,
    },
}

impl PassStart {
    pub fn generation(&self) -> u64 {
        match self {
            PassStart::NoTexture { generation } | PassStart::Pending { generation, .. } => {
                *generation
            }
            PassStart::Ready(frame) => frame.generation,
        }
    }
}

/// Outcome of feeding one decode completion back
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    /// Addressed to a pass that is no longer current; nothing changed
    Stale,
    /// The pass still waits on `remaining` decodes
    Pending { remaining: usize },
    /// That was the last decode; the pass painted this frame
    Ready(TextureFrame),
}

#[derive(Debug)]
struct CachedDecode {
    fingerprint: u64,
    /// `None` records a payload that failed to decode
    image: Option<Arc<DecodedImage>>,
}

#[derive(Debug)]
struct PendingPass {
    generation: u64,
    width: u32,
    height: u32,
    elements: Vec<DesignElement>,
    /// Outstanding decodes by element, with the fingerprint they were issued for
    waiting: HashMap<ElementId, u64>,
}

/// Paints the layer stack into texture frames
pub struct Compositor {
    options: RenderOptions,
    generation: u64,
    pending: Option<PendingPass>,
    cache: HashMap<ElementId, CachedDecode>,
    last_frame: Option<TextureFrame>,
    events: Arc<EventBus>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("generation", &self.generation)
            .field("pending", &self.pending.as_ref().map(|p| p.waiting.len()))
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Compositor {
    pub fn new(options: RenderOptions) -> Self {
        Self::with_event_bus(options, event_bus())
    }

    pub fn with_event_bus(options: RenderOptions, events: Arc<EventBus>) -> Self {
        Self {
            options,
            generation: 0,
            pending: None,
            cache: HashMap::new(),
            last_frame: None,
            events,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Generation of the most recently started pass
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Decodes the current pass is still waiting for
    pub fn pending_count(&self) -> usize {
        self.pending.as_ref().map_or(0, |p| p.waiting.len())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Most recently published frame, `None` after a clear
    pub fn last_frame(&self) -> Option<&TextureFrame> {
        self.last_frame.as_ref()
    }

    fn emit(&self, event: RenderEvent) {
        let _ = self.events.publish(EditorEvent::Render(event));
    }

    /// Start a pass over `elements` at the given raster size
    ///
    /// Any pass still waiting on decodes is superseded. An empty element
    /// list clears the texture; a list whose elements are all hidden
    /// produces a transparent raster.
    pub fn begin_pass(&mut self, elements: &[DesignElement], canvas: (u32, u32)) -> PassStart {
        self.generation += 1;
        let generation = self.generation;

        if let Some(previous) = self.pending.take() {
            debug!(
                "Pass {} superseded with {} decodes outstanding",
                previous.generation,
                previous.waiting.len()
            );
            self.emit(RenderEvent::PassSuperseded {
                generation: previous.generation,
            });
        }

        if elements.is_empty() {
            self.last_frame = None;
            self.emit(RenderEvent::TextureCleared { generation });
            return PassStart::NoTexture { generation };
        }

        let (width, height) = (canvas.0.max(1), canvas.1.max(1));
        self.prune_cache(elements);

        let mut requests = Vec::new();
        for element in elements.iter().filter(|e| e.is_visible()) {
            let DesignElement::Image(image) = element else {
                continue;
            };
            let fingerprint = payload_fingerprint(&image.image_data);
            let cached = self
                .cache
                .get(&image.common.id)
                .is_some_and(|c| c.fingerprint == fingerprint);
            if !cached {
                requests.push(DecodeRequest {
                    generation,
                    element: image.common.id.clone(),
                    payload: image.image_data.clone(),
                    fingerprint,
                });
            }
        }

        self.emit(RenderEvent::PassStarted {
            generation,
            pending: requests.len(),
        });

        if requests.is_empty() {
            return match self.paint(generation, width, height, elements) {
                Some(frame) => PassStart::Ready(frame),
                None => PassStart::NoTexture { generation },
            };
        }

        debug!("Pass {} waiting on {} decodes", generation, requests.len());
        self.pending = Some(PendingPass {
            generation,
            width,
            height,
            elements: elements.to_vec(),
            waiting: requests
                .iter()
                .map(|r| (r.element.clone(), r.fingerprint))
                .collect(),
        });
        PassStart::Pending {
            generation,
            requests,
        }
    }

    /// Feed back the result of one decode request
    pub fn complete_decode(&mut self, completion: DecodeCompletion) -> CompletionOutcome {
        let Some(pass) = self.pending.as_mut() else {
            debug!("Ignoring decode for {}: no pass pending", completion.element);
            return CompletionOutcome::Stale;
        };
        if pass.generation != completion.generation
            || pass.waiting.get(&completion.element) != Some(&completion.fingerprint)
        {
            debug!(
                "Ignoring stale decode for {} (pass {}, current {})",
                completion.element, completion.generation, pass.generation
            );
            return CompletionOutcome::Stale;
        }
        pass.waiting.remove(&completion.element);
        let remaining = pass.waiting.len();

        let image = match completion.result {
            Ok(image) => Some(image),
            Err(err) => {
                warn!("Skipping image {}: {}", completion.element, err);
                self.emit(RenderEvent::DecodeFailed {
                    generation: completion.generation,
                    element: completion.element.clone(),
                    reason: err.to_string(),
                });
                None
            }
        };
        self.cache.insert(
            completion.element,
            CachedDecode {
                fingerprint: completion.fingerprint,
                image,
            },
        );

        if remaining > 0 {
            return CompletionOutcome::Pending { remaining };
        }

        let Some(pass) = self.pending.take() else {
            return CompletionOutcome::Stale;
        };
        match self.paint(pass.generation, pass.width, pass.height, &pass.elements) {
            Some(frame) => CompletionOutcome::Ready(frame),
            None => CompletionOutcome::Stale,
        }
    }

    /// Run a whole pass on the current thread, decoding inline
    ///
    /// Returns `None` when the pass produced no texture.
    pub fn render_blocking(
        &mut self,
        elements: &[DesignElement],
        canvas: (u32, u32),
    ) -> Option<TextureFrame> {
        match self.begin_pass(elements, canvas) {
            PassStart::NoTexture { .. } => None,
            PassStart::Ready(frame) => Some(frame),
            PassStart::Pending { requests, .. } => {
                let mut last = None;
                for request in requests {
                    if let CompletionOutcome::Ready(frame) = self.complete_decode(request.run()) {
                        last = Some(frame);
                    }
                }
                last
            }
        }
    }

    /// Forget cached decodes for elements no longer present
    fn prune_cache(&mut self, elements: &[DesignElement]) {
        let live: HashSet<&ElementId> = elements
            .iter()
            .filter(|e| matches!(e, DesignElement::Image(_)))
            .map(|e| e.id())
            .collect();
        self.cache.retain(|id, _| live.contains(id));
    }

    fn paint(
        &mut self,
        generation: u64,
        width: u32,
        height: u32,
        elements: &[DesignElement],
    ) -> Option<TextureFrame> {
        let images: HashMap<ElementId, Arc<DecodedImage>> = self
            .cache
            .iter()
            .filter_map(|(id, c)| c.image.as_ref().map(|img| (id.clone(), img.clone())))
            .collect();
        let ordered = paint_order(elements);

        let Some(pixmap) = paint_elements(width, height, &ordered, &images, &self.options) else {
            warn!("Cannot allocate a {}x{} texture", width, height);
            return None;
        };
        let frame = TextureFrame::from_pixmap(&pixmap, generation);
        info!(
            "Pass {} painted {} elements at {}x{}",
            generation,
            elements.len(),
            width,
            height
        );
        self.last_frame = Some(frame.clone());
        self.emit(RenderEvent::TexturePublished {
            generation,
            width,
            height,
        });
        Some(frame)
    }
}
