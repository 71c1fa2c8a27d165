//! Product meshes.
//!
//! Models are read from glTF/GLB or STL (binary or ASCII), flattened to a
//! single interleaved vertex buffer and normalised so the largest dimension
//! is [`NORMALIZED_SIZE`] with the bounding box centred on the origin.
//!
//! glTF models keep their own normals and first UV set; STL carries neither,
//! so those get face normals and a planar projection.

use std::io::Cursor;
use std::path::Path;

use atelier_core::MeshLoadError;
use glam::{Mat3, Mat4, Vec3};
use tracing::{debug, warn};

/// Largest dimension of a loaded model after normalisation
pub const NORMALIZED_SIZE: f32 = 2.0;

/// Placeholder box shown when the model cannot be loaded
pub const PLACEHOLDER_SIZE: [f32; 3] = [1.5, 1.5, 0.3];

/// Floats per vertex: position (3), normal (3), uv (2)
pub const VERTEX_STRIDE: usize = 8;

/// Triangle mesh ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct ProductMesh {
    /// Interleaved `[x, y, z, nx, ny, nz, u, v]`
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    /// True when this mesh stands in for a model that failed to load
    pub placeholder: bool,
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn gltf_error(label: &str, err: gltf::Error) -> MeshLoadError {
    match err {
        gltf::Error::Io(e) => MeshLoadError::Io {
            path: label.to_string(),
            reason: e.to_string(),
        },
        other => MeshLoadError::Parse {
            path: label.to_string(),
            reason: other.to_string(),
        },
    }
}

impl ProductMesh {
    /// Load a model from disk, picking the reader by file extension
    pub fn load(path: &Path) -> Result<Self, MeshLoadError> {
        match extension_of(path).as_deref() {
            Some("gltf" | "glb") => Self::load_gltf(path),
            Some("stl") => Self::load_stl(path),
            _ => Err(MeshLoadError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// Load a glTF or GLB model, resolving external buffers next to it
    ///
    /// Images referenced by the model are not read; the design texture
    /// replaces them.
    pub fn load_gltf(path: &Path) -> Result<Self, MeshLoadError> {
        let label = path.display().to_string();
        let gltf::Gltf { document, blob } =
            gltf::Gltf::open(path).map_err(|e| gltf_error(&label, e))?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob)
            .map_err(|e| gltf_error(&label, e))?;
        Self::from_gltf_document(&document, &buffers, &label)
    }

    /// Parse a GLB blob or a `.gltf` whose buffers are embedded data URIs
    pub fn from_gltf_bytes(data: &[u8], label: &str) -> Result<Self, MeshLoadError> {
        let gltf::Gltf { document, blob } =
            gltf::Gltf::from_slice(data).map_err(|e| gltf_error(label, e))?;
        let buffers =
            gltf::import_buffers(&document, None, blob).map_err(|e| gltf_error(label, e))?;
        Self::from_gltf_document(&document, &buffers, label)
    }

    fn from_gltf_document(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
        label: &str,
    ) -> Result<Self, MeshLoadError> {
        let mut builder = GltfBuilder::new(buffers);
        match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => {
                for node in scene.nodes() {
                    builder.visit(&node, Mat4::IDENTITY);
                }
            }
            None => {
                for mesh in document.meshes() {
                    builder.add_mesh(&mesh, Mat4::IDENTITY);
                }
            }
        }
        debug!(
            "glTF {} yielded {} triangles",
            label,
            builder.mesh.triangle_count()
        );

        let GltfBuilder {
            mut mesh,
            missing_uvs,
            ..
        } = builder;
        if mesh.indices.is_empty() {
            return Err(MeshLoadError::EmptyMesh {
                path: label.to_string(),
            });
        }
        if missing_uvs {
            mesh.project_uvs();
        }
        mesh.normalize();
        Ok(mesh)
    }

    /// Load an STL model from disk
    pub fn load_stl(path: &Path) -> Result<Self, MeshLoadError> {
        let display = path.display().to_string();
        let is_stl = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("stl"))
            .unwrap_or(false);
        if !is_stl {
            return Err(MeshLoadError::UnsupportedFormat { path: display });
        }

        let bytes = std::fs::read(path).map_err(|e| MeshLoadError::Io {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        Self::from_stl_bytes(&bytes, &display)
    }

    /// Parse STL data; `label` names the source in errors
    pub fn from_stl_bytes(data: &[u8], label: &str) -> Result<Self, MeshLoadError> {
        let mut cursor = Cursor::new(data);
        let stl = stl_io::read_stl(&mut cursor).map_err(|e| MeshLoadError::Parse {
            path: label.to_string(),
            reason: e.to_string(),
        })?;
        debug!("STL {} contains {} faces", label, stl.faces.len());

        let mut triangles = Vec::with_capacity(stl.faces.len());
        for face in &stl.faces {
            let corner = |i: usize| {
                stl.vertices
                    .get(face.vertices[i])
                    .map(|v| Vec3::new(v[0], v[1], v[2]))
            };
            if let (Some(a), Some(b), Some(c)) = (corner(0), corner(1), corner(2)) {
                if a.is_finite() && b.is_finite() && c.is_finite() {
                    triangles.push([a, b, c]);
                }
            }
        }
        if triangles.is_empty() {
            return Err(MeshLoadError::EmptyMesh {
                path: label.to_string(),
            });
        }

        let mut mesh = Self::from_triangles(&triangles);
        mesh.normalize();
        Ok(mesh)
    }

    /// Model at `path`, or the placeholder box when it cannot be loaded
    pub fn load_or_placeholder(path: &Path) -> (Self, Option<MeshLoadError>) {
        match Self::load(path) {
            Ok(mesh) => (mesh, None),
            Err(err) => {
                warn!("Using placeholder for {}: {}", path.display(), err);
                (Self::placeholder(), Some(err))
            }
        }
    }

    pub fn placeholder() -> Self {
        let [w, h, d] = PLACEHOLDER_SIZE;
        let mut mesh = Self::create_box(w, h, d);
        mesh.placeholder = true;
        mesh
    }

    /// Axis-aligned box centred on the origin, one quad per side
    pub fn create_box(width: f32, height: f32, depth: f32) -> Self {
        let (hx, hy, hz) = (width / 2.0, height / 2.0, depth / 2.0);
        // (normal, four corners counter-clockwise seen from outside)
        let faces: [(Vec3, [Vec3; 4]); 6] = [
            (
                Vec3::Z,
                [
                    Vec3::new(-hx, -hy, hz),
                    Vec3::new(hx, -hy, hz),
                    Vec3::new(hx, hy, hz),
                    Vec3::new(-hx, hy, hz),
                ],
            ),
            (
                Vec3::NEG_Z,
                [
                    Vec3::new(hx, -hy, -hz),
                    Vec3::new(-hx, -hy, -hz),
                    Vec3::new(-hx, hy, -hz),
                    Vec3::new(hx, hy, -hz),
                ],
            ),
            (
                Vec3::X,
                [
                    Vec3::new(hx, -hy, hz),
                    Vec3::new(hx, -hy, -hz),
                    Vec3::new(hx, hy, -hz),
                    Vec3::new(hx, hy, hz),
                ],
            ),
            (
                Vec3::NEG_X,
                [
                    Vec3::new(-hx, -hy, -hz),
                    Vec3::new(-hx, -hy, hz),
                    Vec3::new(-hx, hy, hz),
                    Vec3::new(-hx, hy, -hz),
                ],
            ),
            (
                Vec3::Y,
                [
                    Vec3::new(-hx, hy, hz),
                    Vec3::new(hx, hy, hz),
                    Vec3::new(hx, hy, -hz),
                    Vec3::new(-hx, hy, -hz),
                ],
            ),
            (
                Vec3::NEG_Y,
                [
                    Vec3::new(-hx, -hy, -hz),
                    Vec3::new(hx, -hy, -hz),
                    Vec3::new(hx, -hy, hz),
                    Vec3::new(-hx, -hy, hz),
                ],
            ),
        ];
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        let mut vertices = Vec::with_capacity(24 * VERTEX_STRIDE);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in faces {
            let base = (vertices.len() / VERTEX_STRIDE) as u32;
            for (corner, uv) in corners.iter().zip(uvs) {
                vertices.extend_from_slice(&corner.to_array());
                vertices.extend_from_slice(&normal.to_array());
                vertices.extend_from_slice(&uv);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self {
            vertices,
            indices,
            placeholder: false,
        }
    }

    fn from_triangles(triangles: &[[Vec3; 3]]) -> Self {
        let mut vertices = Vec::with_capacity(triangles.len() * 3 * VERTEX_STRIDE);
        for [a, b, c] in triangles {
            let normal = (*b - *a).cross(*c - *a).normalize_or_zero();
            for p in [a, b, c] {
                vertices.extend_from_slice(&p.to_array());
                vertices.extend_from_slice(&normal.to_array());
                vertices.extend_from_slice(&[0.0, 0.0]);
            }
        }
        let indices = (0..(triangles.len() * 3) as u32).collect();
        let mut mesh = Self {
            vertices,
            indices,
            placeholder: false,
        };
        mesh.project_uvs();
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|v| Vec3::new(v[0], v[1], v[2]))
    }

    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut positions = self.positions();
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    pub fn size(&self) -> Vec3 {
        self.bounds().map(|(min, max)| max - min).unwrap_or(Vec3::ZERO)
    }

    /// Scale to [`NORMALIZED_SIZE`] and centre the bounding box on the origin
    pub fn normalize(&mut self) {
        let Some((min, max)) = self.bounds() else {
            return;
        };
        let center = (min + max) / 2.0;
        let largest = (max - min).max_element();
        let scale = if largest > f32::EPSILON {
            NORMALIZED_SIZE / largest
        } else {
            1.0
        };
        for v in self.vertices.chunks_exact_mut(VERTEX_STRIDE) {
            v[0] = (v[0] - center.x) * scale;
            v[1] = (v[1] - center.y) * scale;
            v[2] = (v[2] - center.z) * scale;
        }
    }

    /// Front-facing planar UVs over the XY extent; v grows downwards
    fn project_uvs(&mut self) {
        let Some((min, max)) = self.bounds() else {
            return;
        };
        let extent = (max - min).max(Vec3::splat(f32::EPSILON));
        for v in self.vertices.chunks_exact_mut(VERTEX_STRIDE) {
            v[6] = (v[0] - min.x) / extent.x;
            v[7] = 1.0 - (v[1] - min.y) / extent.y;
        }
    }

    /// Vertex buffer as raw bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Flattens the triangle primitives of a glTF scene graph into one mesh
struct GltfBuilder<'a> {
    buffers: &'a [gltf::buffer::Data],
    mesh: ProductMesh,
    /// No primitive carried `TEXCOORD_0`
    missing_uvs: bool,
}

impl<'a> GltfBuilder<'a> {
    fn new(buffers: &'a [gltf::buffer::Data]) -> Self {
        Self {
            buffers,
            mesh: ProductMesh {
                vertices: Vec::new(),
                indices: Vec::new(),
                placeholder: false,
            },
            missing_uvs: true,
        }
    }

    fn visit(&mut self, node: &gltf::Node<'_>, parent: Mat4) {
        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
        if let Some(mesh) = node.mesh() {
            self.add_mesh(&mesh, world);
        }
        for child in node.children() {
            self.visit(&child, world);
        }
    }

    fn add_mesh(&mut self, mesh: &gltf::Mesh<'_>, world: Mat4) {
        let linear = Mat3::from_mat4(world);
        let normal_matrix = if linear.determinant().abs() > f32::EPSILON {
            linear.inverse().transpose()
        } else {
            linear
        };

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                debug!("Skipping {:?} primitive", primitive.mode());
                continue;
            }
            let buffers = self.buffers;
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<Vec3> = positions
                .map(|p| world.transform_point3(Vec3::from_array(p)))
                .collect();
            let count = positions.len();
            let normals: Option<Vec<Vec3>> = reader.read_normals().map(|normals| {
                normals
                    .map(|n| (normal_matrix * Vec3::from_array(n)).normalize_or_zero())
                    .collect()
            });
            let uvs: Option<Vec<[f32; 2]>> =
                reader.read_tex_coords(0).map(|t| t.into_f32().collect());
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..count as u32).collect(),
            };

            let triangles: Vec<[u32; 3]> = indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .filter(|t| {
                    t.iter().all(|&i| {
                        positions
                            .get(i as usize)
                            .is_some_and(|p| p.is_finite())
                    })
                })
                .collect();
            if triangles.is_empty() {
                continue;
            }

            let normals = normals
                .filter(|n| n.len() == count)
                .unwrap_or_else(|| smooth_normals(&positions, &triangles));
            let uvs = uvs.filter(|uv| uv.len() == count);
            if uvs.is_some() {
                self.missing_uvs = false;
            }

            let base = self.mesh.vertex_count() as u32;
            for (i, position) in positions.iter().enumerate() {
                self.mesh.vertices.extend_from_slice(&position.to_array());
                self.mesh.vertices.extend_from_slice(&normals[i].to_array());
                let uv = uvs.as_ref().map_or([0.0, 0.0], |uv| uv[i]);
                self.mesh.vertices.extend_from_slice(&uv);
            }
            self.mesh
                .indices
                .extend(triangles.iter().flatten().map(|i| base + i));
        }
    }
}

/// Area-weighted vertex normals for a primitive that has none
fn smooth_normals(positions: &[Vec3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for [a, b, c] in triangles {
        let (pa, pb, pc) = (
            positions[*a as usize],
            positions[*b as usize],
            positions[*c as usize],
        );
        let face = (pb - pa).cross(pc - pa);
        for i in [a, b, c] {
            normals[*i as usize] += face;
        }
    }
    normals.iter().map(|n| n.normalize_or_zero()).collect()
}
