//! # Atelier Viewport
//!
//! The 3D product preview: an orbit camera, a fixed studio scene, the
//! product mesh and a material whose albedo texture is fed by the design
//! compositor.
//!
//! GPU access goes through [`RenderBackend`]; [`HeadlessBackend`] keeps
//! everything in memory and can bake a flat atlas preview.

pub mod backend;
pub mod bake;
pub mod camera;
pub mod controller;
pub mod material;
pub mod mesh;
pub mod scene;

pub use backend::{DrawRecord, FrameParams, HeadlessBackend, RenderBackend};
pub use bake::bake_atlas;
pub use camera::OrbitCamera;
pub use controller::{ViewportController, ViewportState};
pub use material::{ProductMaterial, TextureHandle};
pub use mesh::{ProductMesh, NORMALIZED_SIZE, PLACEHOLDER_SIZE};
pub use scene::SceneDescription;
