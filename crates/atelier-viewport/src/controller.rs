//! Viewport lifecycle.
//!
//! ```text
//! Uninitialized ──load──> Loading ──> Ready ──dispose──> Disposed
//!        └──────────────────dispose──────────────────────┘
//! ```
//!
//! Colour, texture and render calls are only accepted while `Ready`.
//! Nothing leaves `Disposed`.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use atelier_core::{
    event_bus, Color, EditorEvent, EventBus, MeshLoadError, ViewportError, ViewportEvent,
};
use atelier_designer::{PassStart, TextureFrame, TextureSink};
use atelier_settings::CameraSettings;
use tracing::{debug, info, warn};

use crate::backend::{FrameParams, RenderBackend};
use crate::camera::OrbitCamera;
use crate::material::{ProductMaterial, TextureHandle};
use crate::mesh::ProductMesh;
use crate::scene::SceneDescription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportState {
    Uninitialized,
    Loading,
    Ready,
    Disposed,
}

impl fmt::Display for ViewportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewportState::Uninitialized => write!(f, "Uninitialized"),
            ViewportState::Loading => write!(f, "Loading"),
            ViewportState::Ready => write!(f, "Ready"),
            ViewportState::Disposed => write!(f, "Disposed"),
        }
    }
}

/// Owns the 3D scene for one editor session
pub struct ViewportController<B: RenderBackend> {
    backend: B,
    state: ViewportState,
    camera: OrbitCamera,
    scene: SceneDescription,
    material: ProductMaterial,
    mesh: Option<ProductMesh>,
    texture_revision: u64,
    events: Arc<EventBus>,
}

impl<B: RenderBackend> ViewportController<B> {
    pub fn new(backend: B, camera: &CameraSettings) -> Self {
        Self::with_event_bus(backend, camera, event_bus())
    }

    pub fn with_event_bus(backend: B, camera: &CameraSettings, events: Arc<EventBus>) -> Self {
        Self {
            backend,
            state: ViewportState::Uninitialized,
            camera: OrbitCamera::from_settings(camera),
            scene: SceneDescription::standard(),
            material: ProductMaterial::default(),
            mesh: None,
            texture_revision: 0,
            events,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ViewportState::Ready
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn scene(&self) -> &SceneDescription {
        &self.scene
    }

    pub fn material(&self) -> &ProductMaterial {
        &self.material
    }

    pub fn mesh(&self) -> Option<&ProductMesh> {
        self.mesh.as_ref()
    }

    /// Number of texture uploads since the viewport was created
    pub fn texture_revision(&self) -> u64 {
        self.texture_revision
    }

    pub fn texture_handle(&self) -> Option<TextureHandle> {
        self.material.albedo_texture
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn emit(&self, event: ViewportEvent) {
        let _ = self.events.publish(EditorEvent::Viewport(event));
    }

    fn transition(&mut self, to: ViewportState) {
        debug!("Viewport {} -> {}", self.state, to);
        let from = std::mem::replace(&mut self.state, to);
        self.emit(ViewportEvent::StateChanged {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    fn require(&self, wanted: ViewportState) -> Result<(), ViewportError> {
        match self.state {
            ViewportState::Disposed => Err(ViewportError::Disposed),
            current if current == wanted => Ok(()),
            current => Err(ViewportError::InvalidStateTransition {
                current: current.to_string(),
                requested: wanted.to_string(),
            }),
        }
    }

    fn require_ready(&self) -> Result<(), ViewportError> {
        self.require(ViewportState::Ready)
    }

    /// Set up the scene with the model at `model`
    ///
    /// A model that cannot be loaded is replaced by a placeholder box and
    /// its error returned as `Ok(Some(_))`; the viewport still becomes ready.
    pub fn load(&mut self, model: &Path) -> Result<Option<MeshLoadError>, ViewportError> {
        self.require(ViewportState::Uninitialized)?;
        self.transition(ViewportState::Loading);

        let (mesh, failure) = ProductMesh::load_or_placeholder(model);
        if let Some(err) = &failure {
            self.emit(ViewportEvent::MeshFallback {
                model: model.display().to_string(),
                reason: err.to_string(),
            });
        }
        self.install_mesh(mesh)?;
        Ok(failure)
    }

    /// Set up the scene with an already built mesh
    pub fn load_mesh(&mut self, mesh: ProductMesh) -> Result<(), ViewportError> {
        self.require(ViewportState::Uninitialized)?;
        self.transition(ViewportState::Loading);
        self.install_mesh(mesh)
    }

    fn install_mesh(&mut self, mesh: ProductMesh) -> Result<(), ViewportError> {
        self.backend.upload_mesh(&mesh)?;
        info!(
            "Viewport ready with {} triangles{}",
            mesh.triangle_count(),
            if mesh.placeholder { " (placeholder)" } else { "" }
        );
        self.mesh = Some(mesh);
        self.transition(ViewportState::Ready);
        Ok(())
    }

    /// Apply the product colour; returns whether the material changed
    pub fn apply_color(&mut self, color: Color) -> Result<bool, ViewportError> {
        self.require_ready()?;
        let changed = self.material.set_base_color(color);
        if changed {
            self.emit(ViewportEvent::ColorApplied {
                color: color.to_hex(),
            });
        }
        Ok(changed)
    }

    /// Push a compositor frame into the live texture
    ///
    /// The first frame creates the texture; later frames update it in place
    /// so the handle on the material never changes.
    pub fn publish_texture(&mut self, frame: &TextureFrame) -> Result<TextureHandle, ViewportError> {
        self.require_ready()?;
        let handle = match self.material.albedo_texture {
            Some(handle) => {
                self.backend.update_texture(handle, frame)?;
                handle
            }
            None => {
                let handle = self.backend.create_texture(frame)?;
                self.material.albedo_texture = Some(handle);
                handle
            }
        };
        self.texture_revision += 1;
        debug!(
            "Texture {} updated to generation {} (revision {})",
            handle, frame.generation, self.texture_revision
        );
        self.emit(ViewportEvent::TextureBound {
            revision: self.texture_revision,
        });
        Ok(handle)
    }

    /// Detach and release the live texture; returns whether one existed
    pub fn clear_texture(&mut self) -> Result<bool, ViewportError> {
        self.require_ready()?;
        match self.material.albedo_texture.take() {
            Some(handle) => {
                self.backend.release_texture(handle);
                self.emit(ViewportEvent::TextureReleased);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Forward the immediate result of a compositor pass
    pub fn apply_pass(&mut self, start: &PassStart) -> Result<(), ViewportError> {
        match start {
            PassStart::Ready(frame) => self.publish_texture(frame).map(|_| ()),
            PassStart::NoTexture { .. } => self.clear_texture().map(|_| ()),
            PassStart::Pending { .. } => self.require_ready(),
        }
    }

    pub fn render_frame(&mut self, aspect_ratio: f32) -> Result<(), ViewportError> {
        self.require_ready()?;
        let params = FrameParams {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(aspect_ratio),
            scene: &self.scene,
            material: &self.material,
        };
        self.backend.draw(&params)
    }

    pub fn zoom_in(&mut self) -> Result<f32, ViewportError> {
        self.ensure_alive()?;
        self.camera.zoom_in();
        Ok(self.camera.radius)
    }

    pub fn zoom_out(&mut self) -> Result<f32, ViewportError> {
        self.ensure_alive()?;
        self.camera.zoom_out();
        Ok(self.camera.radius)
    }

    pub fn orbit(&mut self, delta_alpha: f32, delta_beta: f32) -> Result<(), ViewportError> {
        self.ensure_alive()?;
        self.camera.orbit(delta_alpha, delta_beta);
        Ok(())
    }

    pub fn reset_camera(&mut self) -> Result<(), ViewportError> {
        self.ensure_alive()?;
        self.camera.reset();
        Ok(())
    }

    fn ensure_alive(&self) -> Result<(), ViewportError> {
        if self.state == ViewportState::Disposed {
            Err(ViewportError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Release every backend resource; the viewport cannot be used afterwards
    pub fn dispose(&mut self) -> Result<(), ViewportError> {
        self.ensure_alive()?;
        self.backend.release_all();
        self.material.albedo_texture = None;
        self.mesh = None;
        self.transition(ViewportState::Disposed);
        Ok(())
    }
}

impl<B: RenderBackend> TextureSink for ViewportController<B> {
    fn publish(&mut self, frame: &TextureFrame) {
        if let Err(err) = self.publish_texture(frame) {
            warn!("Dropping texture generation {}: {}", frame.generation, err);
        }
    }

    fn clear(&mut self) {
        if let Err(err) = self.clear_texture() {
            warn!("Cannot clear texture: {}", err);
        }
    }
}
