//! Rasterization of design elements with tiny-skia.
//!
//! The compositor decides *when* a pass may paint; this module only knows
//! *how* each element kind is drawn onto the texture.

use std::collections::HashMap;
use std::sync::Arc;

use atelier_core::{Color, ElementId, Size};
use atelier_settings::EditorConfig;
use rusttype::{point as rt_point, Font, Scale, ScaledGlyph};
use tiny_skia::{
    BlendMode, ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint,
    Stroke, Transform,
};
use tracing::{debug, warn};

use crate::decoding::DecodedImage;
use crate::font_manager;
use crate::model::{DesignElement, ImageElement, ShapeElement, ShapeKind, TextAlign, TextElement};

/// Transparent margin around rasterized text so antialiased edges survive
const TEXT_PAD: f32 = 2.0;

/// A text raster may cover at most this many canvases' worth of pixels
const TEXT_BLOCK_CANVAS_FACTOR: u64 = 4;

/// Star inner radius relative to the outer radius
const STAR_INNER_RATIO: f32 = 0.5;

/// Fallback sizes and fonts used while painting
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub default_image_size: f64,
    pub default_shape_size: f64,
    pub fallback_font_family: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

impl From<&EditorConfig> for RenderOptions {
    fn from(config: &EditorConfig) -> Self {
        Self {
            default_image_size: config.canvas.default_image_size,
            default_shape_size: config.canvas.default_shape_size,
            fallback_font_family: config.fonts.fallback_family.clone(),
        }
    }
}

/// Paint `elements` in the given order onto a fresh transparent raster.
///
/// Hidden elements are skipped. Image elements without an entry in `images`
/// (undecodable payloads) contribute nothing.
pub fn paint_elements(
    width: u32,
    height: u32,
    elements: &[&DesignElement],
    images: &HashMap<ElementId, Arc<DecodedImage>>,
    options: &RenderOptions,
) -> Option<Pixmap> {
    let mut canvas = Pixmap::new(width, height)?;
    for element in elements.iter().filter(|e| e.is_visible()) {
        match element {
            DesignElement::Shape(shape) => draw_shape(&mut canvas, shape, options),
            DesignElement::Image(image) => match images.get(&image.common.id) {
                Some(decoded) => draw_image(&mut canvas, image, decoded, options),
                None => debug!("Skipping undecoded image {}", image.common.id),
            },
            DesignElement::Text(text) => draw_text(&mut canvas, text, options),
        }
    }
    Some(canvas)
}

/// Rotation by `degrees` about `(cx, cy)`
fn rotation_about(degrees: f64, cx: f64, cy: f64) -> Transform {
    if degrees == 0.0 {
        Transform::identity()
    } else {
        Transform::from_rotate_at(degrees as f32, cx as f32, cy as f32)
    }
}

fn resolve_color(hex: &str) -> Color {
    Color::parse_hex(hex).unwrap_or_else(|_| {
        debug!("Unparseable colour '{}', painting black", hex);
        Color::BLACK
    })
}

fn skia_color(color: Color, opacity: f64) -> tiny_skia::Color {
    let c = color.with_opacity(opacity);
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn draw_shape(canvas: &mut Pixmap, shape: &ShapeElement, options: &RenderOptions) {
    let common = &shape.common;
    let size = common
        .size
        .unwrap_or(Size::square(options.default_shape_size));
    let (x, y) = (common.position.x as f32, common.position.y as f32);
    let (w, h) = (size.width as f32, size.height as f32);

    let (path, center) = match shape.shape_type {
        ShapeKind::Rectangle => (
            tiny_skia::Rect::from_xywh(x, y, w, h).map(PathBuilder::from_rect),
            (x + w / 2.0, y + h / 2.0),
        ),
        ShapeKind::Circle => (
            PathBuilder::from_circle(x, y, size.min_side() as f32 / 2.0),
            (x, y),
        ),
        ShapeKind::Triangle => (triangle_path(x, y, w, h), (x + w / 2.0, y + h / 2.0)),
        ShapeKind::Star => (star_path(x, y, w, h), (x + w / 2.0, y + h / 2.0)),
    };
    let Some(path) = path else {
        debug!("Shape {} has no drawable area", common.id);
        return;
    };

    let transform = rotation_about(common.rotation, center.0 as f64, center.1 as f64);
    let mut paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };
    paint.set_color(skia_color(resolve_color(&shape.fill_color), common.opacity));
    canvas.fill_path(&path, &paint, FillRule::Winding, transform, None);

    if let (Some(stroke_color), Some(width)) = (&shape.stroke_color, shape.stroke_width) {
        if width > 0.0 {
            let stroke = Stroke {
                width: width as f32,
                ..Stroke::default()
            };
            paint.set_color(skia_color(resolve_color(stroke_color), common.opacity));
            canvas.stroke_path(&path, &paint, &stroke, transform, None);
        }
    }
}

fn triangle_path(x: f32, y: f32, w: f32, h: f32) -> Option<tiny_skia::Path> {
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(x + w / 2.0, y);
    pb.line_to(x + w, y + h);
    pb.line_to(x, y + h);
    pb.close();
    pb.finish()
}

fn star_path(x: f32, y: f32, w: f32, h: f32) -> Option<tiny_skia::Path> {
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let (cx, cy) = (x + w / 2.0, y + h / 2.0);
    let (rx, ry) = (w / 2.0, h / 2.0);
    let mut pb = PathBuilder::new();
    for i in 0..10 {
        let angle = -std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::PI / 5.0;
        let k = if i % 2 == 0 { 1.0 } else { STAR_INNER_RATIO };
        let (px, py) = (cx + rx * k * angle.cos(), cy + ry * k * angle.sin());
        if i == 0 {
            pb.move_to(px, py);
        } else {
            pb.line_to(px, py);
        }
    }
    pb.close();
    pb.finish()
}

fn draw_image(
    canvas: &mut Pixmap,
    image: &ImageElement,
    decoded: &DecodedImage,
    options: &RenderOptions,
) {
    let common = &image.common;
    let size = common
        .size
        .unwrap_or(Size::square(options.default_image_size));
    if size.width <= 0.0 || size.height <= 0.0 {
        return;
    }

    let (px, py) = (common.position.x, common.position.y);
    let sx = (size.width / decoded.width() as f64) as f32;
    let sy = (size.height / decoded.height() as f64) as f32;
    let transform = rotation_about(common.rotation, px, py)
        .pre_translate(
            (px - size.width / 2.0) as f32,
            (py - size.height / 2.0) as f32,
        )
        .pre_scale(sx, sy);

    let paint = PixmapPaint {
        opacity: common.opacity as f32,
        blend_mode: BlendMode::SourceOver,
        quality: FilterQuality::Bilinear,
    };
    canvas.draw_pixmap(0, 0, decoded.pixmap().as_ref(), &paint, transform, None);
}

fn draw_text(canvas: &mut Pixmap, text: &TextElement, options: &RenderOptions) {
    if text.text.trim().is_empty() {
        return;
    }
    let Some(font) = font_manager::get_font_for(
        &text.font_family,
        &options.fallback_font_family,
        text.font_weight,
        text.font_style,
    ) else {
        warn!("No font for text element {}, skipping", text.common.id);
        return;
    };
    let Some(block) = rasterize_text(text, font, (canvas.width(), canvas.height())) else {
        return;
    };

    let common = &text.common;
    let (px, py) = (common.position.x, common.position.y);
    let transform = rotation_about(common.rotation, px, py).pre_translate(
        px as f32 - block.width / 2.0 - TEXT_PAD,
        py as f32 - block.height / 2.0 - TEXT_PAD,
    );
    let paint = PixmapPaint {
        opacity: common.opacity as f32,
        blend_mode: BlendMode::SourceOver,
        quality: FilterQuality::Bilinear,
    };
    canvas.draw_pixmap(0, 0, block.pixmap.as_ref(), &paint, transform, None);
}

/// Text rendered into its own raster, padded by `TEXT_PAD` on every side
struct TextBlock {
    pixmap: Pixmap,
    /// Width of the text block without padding
    width: f32,
    /// Height of the text block without padding
    height: f32,
}

struct LaidLine {
    glyphs: Vec<(ScaledGlyph<'static>, f32)>,
    width: f32,
}

fn layout_line(font: &'static Font<'static>, scale: Scale, line: &str, spacing: f32) -> LaidLine {
    let mut glyphs = Vec::new();
    let mut x = 0.0f32;
    let mut previous = None;
    for ch in line.chars() {
        let glyph = font.glyph(ch).scaled(scale);
        if let Some(prev) = previous {
            x += font.pair_kerning(scale, prev, glyph.id());
        }
        previous = Some(glyph.id());
        let advance = glyph.h_metrics().advance_width;
        glyphs.push((glyph, x));
        x += advance + spacing;
    }
    let width = if glyphs.is_empty() { 0.0 } else { x - spacing };
    LaidLine {
        glyphs,
        width: width.max(0.0),
    }
}

/// Whether a `pw` x `ph` text raster is small enough to allocate for `canvas`
fn text_block_fits(pw: u32, ph: u32, canvas: (u32, u32)) -> bool {
    let budget = u64::from(canvas.0)
        .saturating_mul(u64::from(canvas.1))
        .saturating_mul(TEXT_BLOCK_CANVAS_FACTOR);
    u64::from(pw)
        .checked_mul(u64::from(ph))
        .is_some_and(|pixels| pixels <= budget)
}

fn rasterize_text(
    text: &TextElement,
    font: &'static Font<'static>,
    canvas: (u32, u32),
) -> Option<TextBlock> {
    let size = text.font_size as f32;
    let scale = Scale::uniform(size);
    let v_metrics = font.v_metrics(scale);
    let glyph_height = v_metrics.ascent - v_metrics.descent;
    let line_advance = (text.line_height as f32 * size).max(1.0);
    let spacing = text.letter_spacing as f32;

    let lines: Vec<LaidLine> = text
        .text
        .split('\n')
        .map(|line| layout_line(font, scale, line, spacing))
        .collect();
    let width = lines.iter().map(|l| l.width).fold(0.0f32, f32::max);
    let height = glyph_height + (lines.len().saturating_sub(1)) as f32 * line_advance;
    if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
        return None;
    }

    let pw = (width + 2.0 * TEXT_PAD).ceil() as u32;
    let ph = (height + 2.0 * TEXT_PAD).ceil() as u32;
    if !text_block_fits(pw, ph, canvas) {
        warn!(
            "Text element {} needs a {}x{} raster on a {}x{} canvas, skipping",
            text.common.id, pw, ph, canvas.0, canvas.1
        );
        return None;
    }

    let color = resolve_color(&text.color);
    let mut pixmap = Pixmap::new(pw, ph)?;
    let pixels = pixmap.pixels_mut();

    for (index, line) in lines.iter().enumerate() {
        let offset = match text.text_align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (width - line.width) / 2.0,
            TextAlign::Right => width - line.width,
        };
        let baseline = TEXT_PAD + v_metrics.ascent + index as f32 * line_advance;
        for (glyph, x) in &line.glyphs {
            let positioned = glyph
                .clone()
                .positioned(rt_point(TEXT_PAD + offset + x, baseline));
            let Some(bb) = positioned.pixel_bounding_box() else {
                continue;
            };
            positioned.draw(|gx, gy, v| {
                let x = bb.min.x + gx as i32;
                let y = bb.min.y + gy as i32;
                if v <= 0.0 || x < 0 || y < 0 || (x as u32) >= pw || (y as u32) >= ph {
                    return;
                }
                let dst = &mut pixels[y as usize * pw as usize + x as usize];
                let alpha = (v.clamp(0.0, 1.0) * color.a as f32).round() as u8;
                // overlapping glyphs keep the stronger coverage
                if alpha > dst.alpha() {
                    *dst = ColorU8::from_rgba(color.r, color.g, color.b, alpha).premultiply();
                }
            });
        }
    }

    Some(TextBlock {
        pixmap,
        width,
        height,
    })
}
