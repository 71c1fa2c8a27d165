//! Product catalog entries and their printable texture areas.
//!
//! Products are supplied whole by the catalog service and never mutated here.
//! The registry answers two questions for the compositor and the shell: which
//! areas a product offers, and how large the raster of the selected one is.

use atelier_core::{Rect, Size};
use serde::{Deserialize, Serialize};

/// Named printable region of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureArea {
    pub id: String,
    pub name: String,
    /// Placement inside the base texture atlas, in atlas pixels
    pub uv_mapping: Rect,
    /// Largest design clients should let users place (advisory)
    pub max_design_size: Size,
    /// Raster dimensions the compositor renders at
    pub canvas_size: Size,
}

impl TextureArea {
    /// Raster size in whole pixels, at least 1x1
    pub fn canvas_pixels(&self) -> (u32, u32) {
        let px = |v: f64| v.round().clamp(1.0, u32::MAX as f64) as u32;
        (px(self.canvas_size.width), px(self.canvas_size.height))
    }

    /// Whether `size` exceeds the advisory maximum
    ///
    /// Nothing in the core rejects oversized elements; shells use this to warn.
    pub fn exceeds_max_design_size(&self, size: &Size) -> bool {
        size.exceeds(&self.max_design_size)
    }
}

/// Immutable catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Decimal string as stored by the catalog, e.g. `"25.00"`
    #[serde(default)]
    pub base_price: String,
    /// Reference to the 3D model file
    pub model_path: String,
    #[serde(default)]
    pub available_colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_sizes: Option<Vec<String>>,
    pub texture_areas: Vec<TextureArea>,
}

impl Product {
    /// Base price in cents, if the decimal string is well formed
    pub fn base_price_cents(&self) -> Option<u64> {
        let (units, fraction) = match self.base_price.trim().split_once('.') {
            Some((u, f)) => (u, f),
            None => (self.base_price.trim(), ""),
        };
        if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let units: u64 = units.parse().ok()?;
        let cents: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().ok()? * 10,
            _ => fraction.parse().ok()?,
        };
        units.checked_mul(100)?.checked_add(cents)
    }

    /// Bounding box of all UV rectangles
    pub fn atlas_extent(&self) -> Option<Rect> {
        let mut areas = self.texture_areas.iter().map(|a| a.uv_mapping);
        let first = areas.next()?;
        Some(areas.fold(
            Rect::new(0.0, 0.0, first.right(), first.bottom()),
            |acc, r| acc.union(&r),
        ))
    }
}

/// Lookup over the texture areas of the active product
#[derive(Debug, Clone)]
pub struct TextureAreaRegistry {
    product: Product,
}

impl TextureAreaRegistry {
    pub fn new(product: Product) -> Self {
        Self { product }
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    /// All areas in catalog order
    pub fn areas(&self) -> &[TextureArea] {
        &self.product.texture_areas
    }

    pub fn get(&self, id: &str) -> Option<&TextureArea> {
        self.product.texture_areas.iter().find(|a| a.id == id)
    }

    /// The area called `preferred`, else the first one
    pub fn resolve(&self, preferred: &str) -> Option<&TextureArea> {
        self.get(preferred)
            .or_else(|| self.product.texture_areas.first())
    }

    /// Raster size for `area_id`, or `fallback` when the product has no such area
    pub fn canvas_size_for(&self, area_id: &str, fallback: (u32, u32)) -> (u32, u32) {
        self.get(area_id)
            .map(TextureArea::canvas_pixels)
            .unwrap_or(fallback)
    }

    /// Advisory maximum design size for `area_id`
    pub fn max_design_size_for(&self, area_id: &str) -> Option<Size> {
        self.get(area_id).map(|a| a.max_design_size)
    }
}
