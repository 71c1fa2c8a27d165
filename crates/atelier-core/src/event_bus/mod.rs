//! # Event Bus Module
//!
//! Publish/subscribe plumbing between the editor components and the shell
//! hosting them.
//!
//! - The layer stack, compositor, viewport and persistence code publish typed
//!   events without knowing who listens
//! - Shells subscribe with a category filter, or poll a broadcast receiver from
//!   a tokio task
//!
//! ```rust,ignore
//! use atelier_core::event_bus::{EditorEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = Arc::new(EventBus::new());
//! bus.subscribe(EventFilter::Categories(vec![EventCategory::Persistence]), |event| {
//!     tracing::info!("{}", event.description());
//! });
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
