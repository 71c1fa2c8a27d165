//! Render backend seam.
//!
//! The controller only talks to the GPU through [`RenderBackend`]. The
//! headless implementation keeps everything in memory, which is what the
//! CLI and the tests use.

use std::collections::HashMap;

use atelier_core::{Color, ViewportError};
use atelier_designer::{Product, TextureArea, TextureFrame};
use glam::Mat4;
use image::RgbaImage;
use tracing::debug;

use crate::bake::bake_atlas;
use crate::material::{ProductMaterial, TextureHandle};
use crate::mesh::ProductMesh;
use crate::scene::SceneDescription;

/// Everything needed to draw one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameParams<'a> {
    pub view: Mat4,
    pub projection: Mat4,
    pub scene: &'a SceneDescription,
    pub material: &'a ProductMaterial,
}

pub trait RenderBackend: Send {
    fn upload_mesh(&mut self, mesh: &ProductMesh) -> Result<(), ViewportError>;

    /// Allocate a texture and fill it with `frame`
    fn create_texture(&mut self, frame: &TextureFrame) -> Result<TextureHandle, ViewportError>;

    /// Replace the contents of `handle`; a new size reallocates storage only
    fn update_texture(
        &mut self,
        handle: TextureHandle,
        frame: &TextureFrame,
    ) -> Result<(), ViewportError>;

    fn release_texture(&mut self, handle: TextureHandle);

    fn draw(&mut self, frame: &FrameParams<'_>) -> Result<(), ViewportError>;

    /// Drop every resource the backend holds
    fn release_all(&mut self);
}

/// What the last [`RenderBackend::draw`] call saw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub base_color: Color,
    pub texture: Option<TextureHandle>,
    pub view: Mat4,
}

#[derive(Debug, Clone)]
struct StoredTexture {
    image: RgbaImage,
    generation: u64,
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    textures: HashMap<TextureHandle, StoredTexture>,
    next_handle: u64,
    mesh: Option<ProductMesh>,
    uploads: usize,
    allocations: usize,
    frames_drawn: u64,
    last_draw: Option<DrawRecord>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture uploads so far, creations included
    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    /// Backing-store allocations so far
    pub fn allocation_count(&self) -> usize {
        self.allocations
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn last_draw(&self) -> Option<&DrawRecord> {
        self.last_draw.as_ref()
    }

    pub fn mesh(&self) -> Option<&ProductMesh> {
        self.mesh.as_ref()
    }

    pub fn texture_pixels(&self, handle: TextureHandle) -> Option<&RgbaImage> {
        self.textures.get(&handle).map(|t| &t.image)
    }

    /// Generation of the frame last uploaded into `handle`
    pub fn texture_generation(&self, handle: TextureHandle) -> Option<u64> {
        self.textures.get(&handle).map(|t| t.generation)
    }

    /// Atlas preview: product colour with the texture in the area's UV rectangle
    pub fn bake(
        &self,
        product: &Product,
        area: &TextureArea,
        material: &ProductMaterial,
    ) -> Option<RgbaImage> {
        let texture = material
            .albedo_texture
            .and_then(|h| self.texture_pixels(h));
        bake_atlas(product, area, material.base_color, texture)
    }

    fn to_image(frame: &TextureFrame) -> Result<RgbaImage, ViewportError> {
        frame.to_rgba_image().ok_or_else(|| ViewportError::Backend {
            reason: format!(
                "frame buffer does not match {}x{}",
                frame.width, frame.height
            ),
        })
    }
}

impl RenderBackend for HeadlessBackend {
    fn upload_mesh(&mut self, mesh: &ProductMesh) -> Result<(), ViewportError> {
        debug!(
            "Uploading mesh: {} vertices, {} bytes",
            mesh.vertex_count(),
            mesh.vertex_bytes().len()
        );
        self.mesh = Some(mesh.clone());
        Ok(())
    }

    fn create_texture(&mut self, frame: &TextureFrame) -> Result<TextureHandle, ViewportError> {
        let image = Self::to_image(frame)?;
        self.next_handle += 1;
        let handle = TextureHandle(self.next_handle);
        self.textures.insert(
            handle,
            StoredTexture {
                image,
                generation: frame.generation,
            },
        );
        self.allocations += 1;
        self.uploads += 1;
        Ok(handle)
    }

    fn update_texture(
        &mut self,
        handle: TextureHandle,
        frame: &TextureFrame,
    ) -> Result<(), ViewportError> {
        let image = Self::to_image(frame)?;
        let stored = self
            .textures
            .get_mut(&handle)
            .ok_or_else(|| ViewportError::Backend {
                reason: format!("unknown texture {}", handle),
            })?;
        if stored.image.dimensions() != image.dimensions() {
            self.allocations += 1;
            stored.image = image;
        } else {
            stored.image.copy_from_slice(&image);
        }
        stored.generation = frame.generation;
        self.uploads += 1;
        Ok(())
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
    }

    fn draw(&mut self, frame: &FrameParams<'_>) -> Result<(), ViewportError> {
        self.frames_drawn += 1;
        self.last_draw = Some(DrawRecord {
            base_color: frame.material.base_color,
            texture: frame.material.albedo_texture,
            view: frame.view,
        });
        Ok(())
    }

    fn release_all(&mut self) {
        self.textures.clear();
        self.mesh = None;
        self.last_draw = None;
    }
}
