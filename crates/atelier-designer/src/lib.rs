//! # Atelier Designer
//!
//! Design composition for the product editor: the element model, the layer
//! stack, the canvas compositor that turns layers into a product texture,
//! and the persistence adapter with autosave.
//!
//! ## Architecture
//!
//! ```text
//! EditorSession
//!   ├── LayerStack (elements, z-order, selection)
//!   ├── TextureAreaRegistry (product areas, canvas sizes)
//!   ├── Compositor (passes, generations, decode fan-in)
//!   │     └── renderer (tiny-skia drawing, rusttype text)
//!   └── TextureSink (the 3D viewport)
//!
//! DesignStore (JSON files, memory) <── autosave task (read-only)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atelier_designer::{EditorSession, ShapeKind};
//!
//! let mut session = EditorSession::open(product, EditorConfig::default());
//! session.add_shape(ShapeKind::Circle)?;
//! let frame = session.render_blocking();
//! ```

pub mod autosave;
pub mod compositor;
pub mod decoding;
pub mod font_manager;
pub mod layer_stack;
pub mod model;
pub mod persistence;
pub mod renderer;
pub mod selection_manager;
pub mod serialization;
pub mod session;
pub mod texture_area;

pub use autosave::{
    save_session, spawn_autosave, spawn_autosave_with_event_bus, AutosaveDecision,
    AutosaveHandle, AutosavePolicy, SessionCheck,
};
pub use compositor::{CompletionOutcome, Compositor, PassStart, TextureFrame, TextureSink};
pub use decoding::{
    decode_payload, payload_fingerprint, DecodeCompletion, DecodeRequest, DecodedImage,
    ImageDecoder,
};
pub use layer_stack::{paint_order, LayerInfo, LayerStack};
pub use model::{
    encode_file, encode_upload, mime_from_path, DesignElement, ElementCommon, ElementKind,
    ElementPatch, FontStyle, FontWeight, ImageElement, ImageFilters, ShapeElement, ShapeKind,
    TextAlign, TextElement,
};
pub use persistence::{DesignStore, InMemoryStore, JsonFileStore};
pub use renderer::RenderOptions;
pub use selection_manager::SelectionManager;
pub use serialization::{DesignDocument, Visibility};
pub use session::{spawn_decode_pump, EditorSession, SharedTextureSink, NEW_TEXT_CONTENT};
pub use texture_area::{Product, TextureArea, TextureAreaRegistry};
