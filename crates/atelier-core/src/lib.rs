//! # Atelier Core
//!
//! Core types and plumbing shared by the Atelier editor crates: the error
//! taxonomy, the event bus, texture-space geometry, colours and identifiers.

pub mod constants;
pub mod data;
pub mod error;
pub mod event_bus;
pub mod types;

pub use data::{Color, ParseColorError, Point, Rect, Size};

pub use error::{
    DecodeError, Error, LayerError, MeshLoadError, PersistenceError, Result, UploadError,
    ViewportError,
};

// Re-export event bus for convenience
pub use event_bus::{
    event_bus, DesignEvent, EditorEvent, EventBus, EventBusConfig, EventCategory, EventFilter,
    PersistenceEvent, RenderEvent, SubscriptionId, ViewportEvent,
};

pub use types::{
    thread_safe, thread_safe_rw, DesignId, ElementId, ThreadSafe, ThreadSafeRw,
};
