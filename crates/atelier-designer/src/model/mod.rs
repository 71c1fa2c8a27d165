//! Design element data model.

pub mod element;
pub mod patch;
pub mod upload;

pub use element::{
    DesignElement, ElementCommon, ElementKind, FontStyle, FontWeight, ImageElement, ImageFilters,
    ShapeElement, ShapeKind, TextAlign, TextElement,
};
pub use patch::ElementPatch;
pub use upload::{encode_file, encode_upload, mime_from_path};
