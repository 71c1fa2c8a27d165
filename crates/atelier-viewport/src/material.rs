//! Product material.
//!
//! Colour and texture live in separate slots so recolouring never touches
//! the design texture and a new texture never resets the colour.

use atelier_core::Color;

/// Backend texture object; stays the same across in-place updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

impl std::fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tex#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductMaterial {
    pub base_color: Color,
    pub metallic: f32,
    pub roughness: f32,
    pub albedo_texture: Option<TextureHandle>,
}

impl Default for ProductMaterial {
    fn default() -> Self {
        Self {
            base_color: Color::WHITE,
            metallic: 0.0,
            roughness: 0.8,
            albedo_texture: None,
        }
    }
}

impl ProductMaterial {
    /// Set the base colour; returns whether anything changed
    pub fn set_base_color(&mut self, color: Color) -> bool {
        if self.base_color == color {
            return false;
        }
        self.base_color = color;
        true
    }

    /// Base colour as RGBA floats
    pub fn base_color_f32(&self) -> [f32; 4] {
        self.base_color.to_f32_array()
    }
}
