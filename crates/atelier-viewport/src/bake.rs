//! Flat atlas preview of a textured product.

use atelier_core::Color;
use atelier_designer::{Product, TextureArea};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Render the product atlas filled with `color`, with `texture` scaled into
/// the UV rectangle of `area`
///
/// Returns `None` when the product has no texture areas or a zero extent.
pub fn bake_atlas(
    product: &Product,
    area: &TextureArea,
    color: Color,
    texture: Option<&RgbaImage>,
) -> Option<RgbaImage> {
    let extent = product.atlas_extent()?;
    let width = extent.right().ceil() as u32;
    let height = extent.bottom().ceil() as u32;
    if width == 0 || height == 0 {
        return None;
    }

    let mut atlas = RgbaImage::from_pixel(width, height, Rgba([color.r, color.g, color.b, 255]));

    if let Some(texture) = texture {
        let uv = area.uv_mapping;
        let target_w = uv.width.round() as u32;
        let target_h = uv.height.round() as u32;
        if target_w > 0 && target_h > 0 {
            let scaled = if texture.dimensions() == (target_w, target_h) {
                texture.clone()
            } else {
                imageops::resize(texture, target_w, target_h, FilterType::Triangle)
            };
            imageops::overlay(
                &mut atlas,
                &scaled,
                uv.x.round() as i64,
                uv.y.round() as i64,
            );
        }
    }
    Some(atlas)
}
