//! Event type definitions for the event bus.
//!
//! Events are grouped by the editor component that raises them. They are
//! cloneable and serializable so a shell can log or replay them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DesignId, ElementId};

/// Root event enum for all editor events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorEvent {
    /// Layer stack and design state changes
    Design(DesignEvent),
    /// Compositor passes and texture publication
    Render(RenderEvent),
    /// 3D viewport lifecycle and material changes
    Viewport(ViewportEvent),
    /// Saving and loading designs
    Persistence(PersistenceEvent),
}

impl EditorEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            EditorEvent::Design(_) => EventCategory::Design,
            EditorEvent::Render(_) => EventCategory::Render,
            EditorEvent::Viewport(_) => EventCategory::Viewport,
            EditorEvent::Persistence(_) => EventCategory::Persistence,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            EditorEvent::Design(e) => e.description(),
            EditorEvent::Render(e) => e.description(),
            EditorEvent::Viewport(e) => e.description(),
            EditorEvent::Persistence(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Layer stack and design state events.
    Design,
    /// Compositor events.
    Render,
    /// Viewport events.
    Viewport,
    /// Persistence events.
    Persistence,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Design => write!(f, "Design"),
            EventCategory::Render => write!(f, "Render"),
            EventCategory::Viewport => write!(f, "Viewport"),
            EventCategory::Persistence => write!(f, "Persistence"),
        }
    }
}

/// Layer stack and design state events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DesignEvent {
    /// An element was appended to the stack.
    ElementAdded {
        /// The new element.
        id: ElementId,
    },
    /// An element's attributes changed.
    ElementUpdated {
        /// The changed element.
        id: ElementId,
    },
    /// An element was deleted.
    ElementRemoved {
        /// The deleted element.
        id: ElementId,
    },
    /// An element moved to the top or bottom of the paint order.
    ElementReordered {
        /// The moved element.
        id: ElementId,
        /// Its new z-index.
        z_index: i32,
    },
    /// The active selection changed.
    SelectionChanged {
        /// The newly selected element, if any.
        id: Option<ElementId>,
    },
    /// The product colour changed.
    ColorChanged {
        /// The new colour as a hex string.
        color: String,
    },
    /// A different texture area was chosen.
    TextureAreaChanged {
        /// The chosen area.
        area_id: String,
    },
    /// A stored design replaced the current one.
    DesignLoaded {
        /// Number of elements restored.
        elements: usize,
    },
}

impl DesignEvent {
    fn description(&self) -> String {
        match self {
            DesignEvent::ElementAdded { id } => format!("Element {} added", id),
            DesignEvent::ElementUpdated { id } => format!("Element {} updated", id),
            DesignEvent::ElementRemoved { id } => format!("Element {} removed", id),
            DesignEvent::ElementReordered { id, z_index } => {
                format!("Element {} moved to z {}", id, z_index)
            }
            DesignEvent::SelectionChanged { id: Some(id) } => format!("Selected {}", id),
            DesignEvent::SelectionChanged { id: None } => "Selection cleared".to_string(),
            DesignEvent::ColorChanged { color } => format!("Product colour {}", color),
            DesignEvent::TextureAreaChanged { area_id } => format!("Texture area {}", area_id),
            DesignEvent::DesignLoaded { elements } => {
                format!("Design loaded with {} elements", elements)
            }
        }
    }
}

/// Compositor events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderEvent {
    /// A render pass began.
    PassStarted {
        /// Pass generation.
        generation: u64,
        /// Image decodes the pass waits for.
        pending: usize,
    },
    /// A pass still waiting on decodes was replaced by a newer one.
    PassSuperseded {
        /// The abandoned generation.
        generation: u64,
    },
    /// A finished raster was handed to the viewport.
    TexturePublished {
        /// Pass generation.
        generation: u64,
        /// Raster width in pixels.
        width: u32,
        /// Raster height in pixels.
        height: u32,
    },
    /// The layer stack is empty and no texture should be shown.
    TextureCleared {
        /// Pass generation.
        generation: u64,
    },
    /// An image payload could not be decoded and will be skipped.
    DecodeFailed {
        /// Pass generation.
        generation: u64,
        /// The affected element.
        element: ElementId,
        /// Decoder message.
        reason: String,
    },
}

impl RenderEvent {
    fn description(&self) -> String {
        match self {
            RenderEvent::PassStarted {
                generation,
                pending,
            } => format!("Pass {} started ({} pending)", generation, pending),
            RenderEvent::PassSuperseded { generation } => {
                format!("Pass {} superseded", generation)
            }
            RenderEvent::TexturePublished {
                generation,
                width,
                height,
            } => format!("Pass {} published {}x{}", generation, width, height),
            RenderEvent::TextureCleared { generation } => {
                format!("Pass {} cleared texture", generation)
            }
            RenderEvent::DecodeFailed {
                element, reason, ..
            } => format!("Decode failed for {}: {}", element, reason),
        }
    }
}

/// Viewport events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewportEvent {
    /// The viewport lifecycle advanced.
    StateChanged {
        /// Previous state name.
        from: String,
        /// New state name.
        to: String,
    },
    /// The product model failed to load and a placeholder is shown.
    MeshFallback {
        /// The model reference that failed.
        model: String,
        /// Why it failed.
        reason: String,
    },
    /// The product base colour was applied to the material.
    ColorApplied {
        /// The colour as a hex string.
        color: String,
    },
    /// The live texture was created or updated.
    TextureBound {
        /// Texture revision after the upload.
        revision: u64,
    },
    /// The live texture was detached and released.
    TextureReleased,
}

impl ViewportEvent {
    fn description(&self) -> String {
        match self {
            ViewportEvent::StateChanged { from, to } => format!("Viewport {} -> {}", from, to),
            ViewportEvent::MeshFallback { model, reason } => {
                format!("Model {} replaced by placeholder: {}", model, reason)
            }
            ViewportEvent::ColorApplied { color } => format!("Material colour {}", color),
            ViewportEvent::TextureBound { revision } => format!("Texture revision {}", revision),
            ViewportEvent::TextureReleased => "Texture released".to_string(),
        }
    }
}

/// Persistence events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PersistenceEvent {
    /// A design was stored.
    Saved {
        /// Store-assigned identifier.
        design_id: DesignId,
        /// Element count of the stored design.
        elements: usize,
        /// Whether the design was published.
        is_public: bool,
        /// Whether the save came from the autosave timer.
        autosave: bool,
        /// When the save completed.
        at: DateTime<Utc>,
    },
    /// Storing a design failed; the in-memory design is untouched.
    SaveFailed {
        /// Store message.
        reason: String,
        /// Whether the save came from the autosave timer.
        autosave: bool,
    },
    /// A stored design was loaded.
    Loaded {
        /// The loaded design.
        design_id: DesignId,
        /// Number of elements.
        elements: usize,
    },
    /// An autosave tick decided not to save.
    AutosaveSkipped {
        /// Why nothing was saved.
        reason: String,
    },
}

impl PersistenceEvent {
    fn description(&self) -> String {
        match self {
            PersistenceEvent::Saved {
                design_id,
                elements,
                autosave,
                ..
            } => format!(
                "{} {} ({} elements)",
                if *autosave { "Autosaved" } else { "Saved" },
                design_id,
                elements
            ),
            PersistenceEvent::SaveFailed { reason, .. } => format!("Save failed: {}", reason),
            PersistenceEvent::Loaded {
                design_id,
                elements,
            } => format!("Loaded {} ({} elements)", design_id, elements),
            PersistenceEvent::AutosaveSkipped { reason } => {
                format!("Autosave skipped: {}", reason)
            }
        }
    }
}
