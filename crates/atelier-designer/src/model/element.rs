//! Design elements.
//!
//! A design is a list of [`DesignElement`]s. Each variant carries the shared
//! [`ElementCommon`] attributes plus its own paint attributes; the serialized
//! form is a flat JSON object discriminated by `"type"`.

use atelier_core::constants::{LAYER_LABEL_MAX_CHARS, DEFAULT_FONT_SIZE};
use atelier_core::{ElementId, LayerError, Point, Size};
use serde::{Deserialize, Serialize};

fn default_opacity() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Attributes shared by every element variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementCommon {
    /// Unique within one design
    pub id: ElementId,
    /// Texture-space anchor; its meaning depends on the variant
    pub position: Point,
    /// Box size; absent for unsized text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Degrees, kept in `[0, 360)`
    #[serde(default)]
    pub rotation: f64,
    /// Element alpha in `[0, 1]`
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Paint order key, ascending
    #[serde(default)]
    pub z_index: i32,
    /// Blocks pointer manipulation
    #[serde(default)]
    pub locked: bool,
    /// Hidden elements are not rasterized
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl ElementCommon {
    /// Fresh attributes at `position` with a generated identifier
    pub fn at(position: Point) -> Self {
        Self {
            id: ElementId::generate(),
            position,
            size: None,
            rotation: 0.0,
            opacity: 1.0,
            z_index: 0,
            locked: false,
            visible: true,
        }
    }

    /// Wrap rotation into `[0, 360)`, clamp opacity, and reject non-finite geometry
    pub fn normalize(&mut self) -> Result<(), LayerError> {
        if !self.position.is_finite() {
            return Err(invalid("position", "coordinates must be finite"));
        }
        if let Some(size) = &self.size {
            if !size.is_valid() {
                return Err(invalid("size", "width and height must be finite and >= 0"));
            }
        }
        if !self.rotation.is_finite() {
            return Err(invalid("rotation", "must be finite"));
        }
        if !self.opacity.is_finite() {
            return Err(invalid("opacity", "must be finite"));
        }
        self.rotation = wrap_degrees(self.rotation);
        self.opacity = self.opacity.clamp(0.0, 1.0);
        Ok(())
    }
}

pub(crate) fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

pub(crate) fn invalid(field: &str, reason: &str) -> LayerError {
    LayerError::InvalidAttribute {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Text weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Text slant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Horizontal alignment of lines inside a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

fn default_line_height() -> f64 {
    1.2
}

fn default_font_family() -> String {
    "Inter".to_string()
}

fn default_font_size() -> f64 {
    64.0
}

/// Text element; `position` is the visual centre of the text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    pub text: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_text_color")]
    pub color: String,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub letter_spacing: f64,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
}

/// Image adjustments. Stored with the design, not applied by the compositor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFilters {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub blur: f64,
    pub grayscale: bool,
    pub sepia: bool,
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
            grayscale: false,
            sepia: false,
        }
    }
}

/// Image element; `position` is the centre of the drawn image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    /// Data URI, or a local file reference
    pub image_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<ImageFilters>,
}

/// Shape outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Triangle,
    Star,
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Star => "star",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShapeKind {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rectangle" | "rect" => Ok(ShapeKind::Rectangle),
            "circle" => Ok(ShapeKind::Circle),
            "triangle" => Ok(ShapeKind::Triangle),
            "star" => Ok(ShapeKind::Star),
            _ => Err(invalid("shapeType", "expected rectangle, circle, triangle or star")),
        }
    }
}

/// Shape element.
///
/// Rectangles, triangles and stars are anchored at their top-left corner.
/// Circles are anchored at their centre, with diameter `min(width, height)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    pub shape_type: ShapeKind,
    pub fill_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

/// Variant tag of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Text,
    Image,
    Shape,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Text => write!(f, "text"),
            ElementKind::Image => write!(f, "image"),
            ElementKind::Shape => write!(f, "shape"),
        }
    }
}

/// One placeable item of a design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DesignElement {
    Text(TextElement),
    Image(ImageElement),
    Shape(ShapeElement),
}

impl DesignElement {
    /// New text element as created by the text tool
    pub fn text(content: impl Into<String>, font_family: impl Into<String>) -> Self {
        let mut common = ElementCommon::at(Point::new(100.0, 100.0));
        common.z_index = 1;
        DesignElement::Text(TextElement {
            common,
            text: content.into(),
            font_family: font_family.into(),
            font_size: DEFAULT_FONT_SIZE,
            color: "#000000".to_string(),
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_align: TextAlign::Center,
            letter_spacing: 0.0,
            line_height: default_line_height(),
        })
    }

    /// New shape element as created by the shape tool
    pub fn shape(kind: ShapeKind) -> Self {
        let mut common = ElementCommon::at(Point::new(150.0, 150.0));
        common.size = Some(Size::square(100.0));
        DesignElement::Shape(ShapeElement {
            common,
            shape_type: kind,
            fill_color: "#3b82f6".to_string(),
            stroke_color: Some("#1e40af".to_string()),
            stroke_width: Some(2.0),
        })
    }

    /// New image element for an already validated payload
    pub fn image(image_data: impl Into<String>) -> Self {
        let mut common = ElementCommon::at(Point::new(1024.0, 800.0));
        common.size = Some(Size::square(250.0));
        DesignElement::Image(ImageElement {
            common,
            image_data: image_data.into(),
            filters: Some(ImageFilters::default()),
        })
    }

    pub fn common(&self) -> &ElementCommon {
        match self {
            DesignElement::Text(e) => &e.common,
            DesignElement::Image(e) => &e.common,
            DesignElement::Shape(e) => &e.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut ElementCommon {
        match self {
            DesignElement::Text(e) => &mut e.common,
            DesignElement::Image(e) => &mut e.common,
            DesignElement::Shape(e) => &mut e.common,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.common().id
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            DesignElement::Text(_) => ElementKind::Text,
            DesignElement::Image(_) => ElementKind::Image,
            DesignElement::Shape(_) => ElementKind::Shape,
        }
    }

    pub fn z_index(&self) -> i32 {
        self.common().z_index
    }

    pub fn is_visible(&self) -> bool {
        self.common().visible
    }

    pub fn is_locked(&self) -> bool {
        self.common().locked
    }

    /// Builder-style identifier override, for callers that manage their own ids
    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.common_mut().id = id.into();
        self
    }

    /// Builder-style position override
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.common_mut().position = Point::new(x, y);
        self
    }

    /// Builder-style size override
    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.common_mut().size = Some(Size::new(width, height));
        self
    }

    /// Builder-style z-index override
    pub fn with_z(mut self, z_index: i32) -> Self {
        self.common_mut().z_index = z_index;
        self
    }

    /// Label shown in the layer panel
    pub fn label(&self) -> String {
        match self {
            DesignElement::Text(t) => t.text.chars().take(LAYER_LABEL_MAX_CHARS).collect(),
            DesignElement::Shape(s) => s.shape_type.to_string(),
            DesignElement::Image(_) => "image".to_string(),
        }
    }

    /// Validate and canonicalize every attribute
    pub fn normalize(&mut self) -> Result<(), LayerError> {
        self.common_mut().normalize()?;
        match self {
            DesignElement::Text(t) => {
                if !t.font_size.is_finite() || t.font_size <= 0.0 {
                    return Err(invalid("fontSize", "must be > 0"));
                }
                if !t.line_height.is_finite() || t.line_height <= 0.0 {
                    return Err(invalid("lineHeight", "must be > 0"));
                }
                if !t.letter_spacing.is_finite() {
                    return Err(invalid("letterSpacing", "must be finite"));
                }
            }
            DesignElement::Shape(s) => {
                if let Some(width) = s.stroke_width {
                    if !width.is_finite() || width < 0.0 {
                        return Err(invalid("strokeWidth", "must be >= 0"));
                    }
                }
            }
            DesignElement::Image(_) => {}
        }
        Ok(())
    }
}
