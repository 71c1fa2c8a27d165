//! Identifier newtypes and shared-state aliases.
//!
//! - [`ids`]: element and design identifiers
//! - [`aliases`]: `Arc<RwLock<T>>` style aliases for state shared with background tasks

pub mod aliases;
pub mod ids;

pub use aliases::*;
pub use ids::{DesignId, ElementId};
