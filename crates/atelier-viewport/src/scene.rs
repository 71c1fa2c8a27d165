//! Static scene around the product: lights, ground and backdrop colour.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphericLight {
    pub direction: Vec3,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub position: Vec3,
    pub intensity: f32,
    pub shadow: Option<ShadowSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowSettings {
    pub map_size: u32,
    pub blur_kernel: u32,
}

/// Flat ground plane under the product
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPlane {
    pub width: f32,
    pub depth: f32,
    /// Height of the plane
    pub y: f32,
    pub color: [f32; 3],
    pub specular: f32,
    pub receives_shadows: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescription {
    pub clear_color: [f32; 4],
    pub ambient: HemisphericLight,
    pub key_light: DirectionalLight,
    pub ground: GroundPlane,
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self::standard()
    }
}

impl SceneDescription {
    /// Studio setup used by the product editor
    pub fn standard() -> Self {
        Self {
            clear_color: [0.1, 0.1, 0.18, 1.0],
            ambient: HemisphericLight {
                direction: Vec3::Y,
                intensity: 0.6,
            },
            key_light: DirectionalLight {
                direction: Vec3::new(-1.0, -2.0, -1.0),
                position: Vec3::new(5.0, 10.0, 5.0),
                intensity: 0.5,
                shadow: Some(ShadowSettings {
                    map_size: 1024,
                    blur_kernel: 32,
                }),
            },
            ground: GroundPlane {
                width: 10.0,
                depth: 10.0,
                y: -1.0,
                color: [0.2, 0.2, 0.25],
                specular: 0.1,
                receives_shadows: true,
            },
        }
    }
}
