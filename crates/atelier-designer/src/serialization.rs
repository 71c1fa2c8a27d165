//! Design documents.
//!
//! The document is the complete, self-contained record of a design: the
//! product it decorates, the chosen colour and texture area, and every
//! element in insertion order. Image payloads travel inline, so a document
//! can be rebuilt without any other file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::layer_stack::LayerStack;
use crate::model::DesignElement;

/// Whether a save keeps the design private or publishes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Draft,
    Publish,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Publish)
    }
}

/// Serializable design handed to the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDocument {
    pub product_id: String,
    pub name: String,
    pub product_color: String,
    pub texture_area_id: String,
    #[serde(default)]
    pub elements: Vec<DesignElement>,
    #[serde(default)]
    pub is_public: bool,
}

impl DesignDocument {
    /// Snapshot a layer stack into a document
    pub fn from_stack(
        product_id: impl Into<String>,
        name: impl Into<String>,
        product_color: impl Into<String>,
        texture_area_id: impl Into<String>,
        stack: &LayerStack,
        visibility: Visibility,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            product_color: product_color.into(),
            texture_area_id: texture_area_id.into(),
            elements: stack.elements().to_vec(),
            is_public: visibility.is_public(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Rebuild the layer stack in stored order
    pub fn to_stack(&self) -> atelier_core::Result<LayerStack> {
        Ok(LayerStack::from_elements(self.elements.clone())?)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize design")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse design document")
    }

    /// Save design to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write design file {}", path.display()))?;
        Ok(())
    }

    /// Load design from file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read design file {}", path.display()))?;
        Self::from_json(&content)
    }
}
