//! Partial element updates.
//!
//! An [`ElementPatch`] lists the attributes a property panel wants to change.
//! Application is strict: a patch naming a field the target variant does not
//! have is rejected with `TypeMismatch`, and nothing is written unless the whole
//! patch validates.

use atelier_core::{Color, LayerError, Point, Size};
use serde::{Deserialize, Serialize};

use super::element::{
    invalid, DesignElement, FontStyle, FontWeight, ImageFilters, ShapeKind, TextAlign,
};

/// Attributes to merge into an existing element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    // shared
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub rotation: Option<f64>,
    pub opacity: Option<f64>,
    pub z_index: Option<i32>,
    pub locked: Option<bool>,
    pub visible: Option<bool>,

    // text
    pub text: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<String>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub text_align: Option<TextAlign>,
    pub letter_spacing: Option<f64>,
    pub line_height: Option<f64>,

    // image
    pub image_data: Option<String>,
    pub filters: Option<ImageFilters>,

    // shape
    pub shape_type: Option<ShapeKind>,
    pub fill_color: Option<String>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f64>,
}

impl ElementPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn fill_color(mut self, color: impl Into<String>) -> Self {
        self.fill_color = Some(color.into());
        self
    }

    /// True when the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn text_fields(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.text.is_some() {
            set.push("text");
        }
        if self.font_family.is_some() {
            set.push("fontFamily");
        }
        if self.font_size.is_some() {
            set.push("fontSize");
        }
        if self.color.is_some() {
            set.push("color");
        }
        if self.font_weight.is_some() {
            set.push("fontWeight");
        }
        if self.font_style.is_some() {
            set.push("fontStyle");
        }
        if self.text_align.is_some() {
            set.push("textAlign");
        }
        if self.letter_spacing.is_some() {
            set.push("letterSpacing");
        }
        if self.line_height.is_some() {
            set.push("lineHeight");
        }
        set
    }

    fn image_fields(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.image_data.is_some() {
            set.push("imageData");
        }
        if self.filters.is_some() {
            set.push("filters");
        }
        set
    }

    fn shape_fields(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.shape_type.is_some() {
            set.push("shapeType");
        }
        if self.fill_color.is_some() {
            set.push("fillColor");
        }
        if self.stroke_color.is_some() {
            set.push("strokeColor");
        }
        if self.stroke_width.is_some() {
            set.push("strokeWidth");
        }
        set
    }

    /// Produce the patched copy of `element`, leaving `element` untouched
    pub fn apply_to(&self, element: &DesignElement) -> Result<DesignElement, LayerError> {
        let kind = element.kind();
        let foreign = match element {
            DesignElement::Text(_) => [self.image_fields(), self.shape_fields()].concat(),
            DesignElement::Image(_) => [self.text_fields(), self.shape_fields()].concat(),
            DesignElement::Shape(_) => [self.text_fields(), self.image_fields()].concat(),
        };
        if let Some(field) = foreign.first() {
            return Err(LayerError::TypeMismatch {
                field: field.to_string(),
                kind: kind.to_string(),
            });
        }

        for (field, value) in [
            ("color", &self.color),
            ("fillColor", &self.fill_color),
            ("strokeColor", &self.stroke_color),
        ] {
            if let Some(value) = value {
                Color::parse_hex(value).map_err(|e| invalid(field, &e.to_string()))?;
            }
        }

        let mut next = element.clone();
        let common = next.common_mut();
        if let Some(position) = self.position {
            common.position = position;
        }
        if let Some(size) = self.size {
            common.size = Some(size);
        }
        if let Some(rotation) = self.rotation {
            common.rotation = rotation;
        }
        if let Some(opacity) = self.opacity {
            common.opacity = opacity;
        }
        if let Some(z_index) = self.z_index {
            common.z_index = z_index;
        }
        if let Some(locked) = self.locked {
            common.locked = locked;
        }
        if let Some(visible) = self.visible {
            common.visible = visible;
        }

        match &mut next {
            DesignElement::Text(t) => {
                if let Some(text) = &self.text {
                    t.text = text.clone();
                }
                if let Some(family) = &self.font_family {
                    t.font_family = family.clone();
                }
                if let Some(size) = self.font_size {
                    t.font_size = size;
                }
                if let Some(color) = &self.color {
                    t.color = color.clone();
                }
                if let Some(weight) = self.font_weight {
                    t.font_weight = weight;
                }
                if let Some(style) = self.font_style {
                    t.font_style = style;
                }
                if let Some(align) = self.text_align {
                    t.text_align = align;
                }
                if let Some(spacing) = self.letter_spacing {
                    t.letter_spacing = spacing;
                }
                if let Some(line_height) = self.line_height {
                    t.line_height = line_height;
                }
            }
            DesignElement::Image(i) => {
                if let Some(data) = &self.image_data {
                    i.image_data = data.clone();
                }
                if let Some(filters) = &self.filters {
                    i.filters = Some(filters.clone());
                }
            }
            DesignElement::Shape(s) => {
                if let Some(kind) = self.shape_type {
                    s.shape_type = kind;
                }
                if let Some(fill) = &self.fill_color {
                    s.fill_color = fill.clone();
                }
                if let Some(stroke) = &self.stroke_color {
                    s.stroke_color = Some(stroke.clone());
                }
                if let Some(width) = self.stroke_width {
                    s.stroke_width = Some(width);
                }
            }
        }

        next.normalize()?;
        Ok(next)
    }
}
