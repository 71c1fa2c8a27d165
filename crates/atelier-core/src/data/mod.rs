//! Plain value types shared across the editor crates.
//!
//! - [`geometry`]: texture-space points, sizes and rectangles
//! - [`color`]: hex colour parsing and formatting

pub mod color;
pub mod geometry;

pub use color::{Color, ParseColorError};
pub use geometry::{Point, Rect, Size};
