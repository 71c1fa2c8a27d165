//! Orbit camera around the product.
//!
//! Angles follow the arc-rotate convention with a Y-up world: `alpha` turns
//! around the vertical axis, `beta` is measured down from the zenith.

use atelier_settings::CameraSettings;
use glam::{Mat4, Vec3};

/// Keeps `beta` away from the poles so the view matrix stays defined
const BETA_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Yaw in radians
    pub alpha: f32,
    /// Elevation from the zenith in radians
    pub beta: f32,
    pub radius: f32,
    pub fov: f32, // degrees
    pub near: f32,
    pub far: f32,
    min_radius: f32,
    max_radius: f32,
    zoom_step: f32,
    home: (f32, f32, f32),
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}

impl OrbitCamera {
    pub fn from_settings(settings: &CameraSettings) -> Self {
        let min_radius = settings.min_radius.min(settings.max_radius);
        let max_radius = settings.max_radius.max(settings.min_radius);
        let radius = settings.radius.clamp(min_radius, max_radius);
        Self {
            target: Vec3::ZERO,
            alpha: settings.alpha,
            beta: settings.beta,
            radius,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
            min_radius,
            max_radius,
            zoom_step: settings.zoom_step,
            home: (settings.alpha, settings.beta, radius),
        }
    }

    pub fn radius_limits(&self) -> (f32, f32) {
        (self.min_radius, self.max_radius)
    }

    /// Move closer by one zoom step, stopping at the minimum radius
    pub fn zoom_in(&mut self) {
        self.set_radius(self.radius - self.zoom_step);
    }

    /// Move away by one zoom step, stopping at the maximum radius
    pub fn zoom_out(&mut self) {
        self.set_radius(self.radius + self.zoom_step);
    }

    pub fn set_radius(&mut self, radius: f32) {
        if radius.is_finite() {
            self.radius = radius.clamp(self.min_radius, self.max_radius);
        }
    }

    pub fn orbit(&mut self, delta_alpha: f32, delta_beta: f32) {
        self.alpha += delta_alpha;
        self.beta = (self.beta + delta_beta).clamp(BETA_EPSILON, std::f32::consts::PI - BETA_EPSILON);
    }

    /// Restore the default pose
    pub fn reset(&mut self) {
        let (alpha, beta, radius) = self.home;
        self.alpha = alpha;
        self.beta = beta;
        self.radius = radius;
        self.target = Vec3::ZERO;
    }

    pub fn eye_position(&self) -> Vec3 {
        let (sin_alpha, cos_alpha) = self.alpha.sin_cos();
        let (sin_beta, cos_beta) = self.beta.sin_cos();
        let offset = Vec3::new(cos_alpha * sin_beta, cos_beta, sin_alpha * sin_beta) * self.radius;
        self.target + offset
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        let aspect = if aspect_ratio > 0.0 { aspect_ratio } else { 1.0 };
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }
}
