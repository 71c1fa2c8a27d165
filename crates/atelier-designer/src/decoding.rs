//! Image payload decoding.
//!
//! Image elements carry their bitmap as a string payload. Decoding turns that
//! payload into a premultiplied [`tiny_skia::Pixmap`] the compositor can draw.
//! Decodes run off the editor thread and report back in whatever order they
//! finish; the compositor sorts that out.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use atelier_core::{DecodeError, ElementId};
use base64::{engine::general_purpose, Engine as _};
use tiny_skia::{ColorU8, Pixmap};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A decoded bitmap, premultiplied RGBA
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixmap: Pixmap,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// One image payload a render pass is waiting for
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeRequest {
    /// Pass that asked for the decode
    pub generation: u64,
    pub element: ElementId,
    pub payload: String,
    /// Fingerprint of `payload`, echoed back in the completion
    pub fingerprint: u64,
}

/// Result of one decode, tagged with the pass that requested it
#[derive(Debug, Clone)]
pub struct DecodeCompletion {
    pub generation: u64,
    pub element: ElementId,
    pub fingerprint: u64,
    pub result: Result<Arc<DecodedImage>, DecodeError>,
}

impl DecodeRequest {
    /// Decode on the current thread
    pub fn run(self) -> DecodeCompletion {
        let result = decode_payload(&self.payload).map(Arc::new);
        DecodeCompletion {
            generation: self.generation,
            element: self.element,
            fingerprint: self.fingerprint,
            result,
        }
    }
}

/// Stable-within-process fingerprint of a payload string
pub fn payload_fingerprint(payload: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    payload.hash(&mut hasher);
    hasher.finish()
}

/// Decode an image payload.
///
/// Accepted forms:
/// - `data:<mime>;base64,<body>` and `data:<mime>,<raw body>`
/// - `file://<path>` or a bare local path
///
/// `http(s)` references are refused; the core never touches the network.
pub fn decode_payload(payload: &str) -> Result<DecodedImage, DecodeError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(DecodeError::UnsupportedPayload {
            reason: "empty payload".to_string(),
        });
    }

    if let Some(rest) = payload.strip_prefix("data:") {
        let (header, body) = rest.split_once(',').ok_or_else(|| DecodeError::InvalidDataUri {
            reason: "missing ',' separator".to_string(),
        })?;
        let bytes = if header.ends_with(";base64") {
            let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            general_purpose::STANDARD
                .decode(compact.as_bytes())
                .map_err(|e| DecodeError::Base64 {
                    reason: e.to_string(),
                })?
        } else {
            body.as_bytes().to_vec()
        };
        return decode_image_bytes(&bytes);
    }

    let lower = payload.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Err(DecodeError::RemoteReference {
            url: payload.to_string(),
        });
    }

    let path = payload.strip_prefix("file://").unwrap_or(payload);
    if path.contains("://") {
        return Err(DecodeError::UnsupportedPayload {
            reason: format!("unknown scheme in '{}'", truncate(payload, 40)),
        });
    }
    let bytes = std::fs::read(Path::new(path)).map_err(|e| DecodeError::Io {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    decode_image_bytes(&bytes)
}

/// Decode encoded image bytes (PNG, JPEG, ...) into a premultiplied pixmap
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| DecodeError::Image {
        reason: e.to_string(),
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| DecodeError::Image {
        reason: format!("unusable image dimensions {}x{}", width, height),
    })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }

    Ok(DecodedImage { pixmap })
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Runs decode requests on tokio's blocking pool.
///
/// Completions arrive on the receiver returned by [`ImageDecoder::channel`],
/// in completion order rather than request order.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    sender: mpsc::UnboundedSender<DecodeCompletion>,
}

impl ImageDecoder {
    /// Create a decoder and the receiving end of its completion channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DecodeCompletion>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Start decoding every request. Must be called inside a tokio runtime.
    pub fn dispatch(&self, requests: Vec<DecodeRequest>) {
        for request in requests {
            let sender = self.sender.clone();
            let element = request.element.clone();
            debug!("Decoding image for {} (pass {})", element, request.generation);
            tokio::task::spawn_blocking(move || {
                let completion = request.run();
                if let Err(err) = &completion.result {
                    warn!("Image decode failed for {}: {}", completion.element, err);
                }
                if sender.send(completion).is_err() {
                    debug!("Decode result for {} dropped, receiver closed", element);
                }
            });
        }
    }
}
