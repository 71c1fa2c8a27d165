use std::fs::File;

use atelier_core::MeshLoadError;
use atelier_viewport::ProductMesh;
use base64::{engine::general_purpose, Engine as _};
use stl_io::{Normal, Triangle, Vertex};

fn write_tetrahedron(path: &std::path::Path, scale: f32) {
    let p = |x: f32, y: f32, z: f32| Vertex::new([x * scale, y * scale, z * scale]);
    let (a, b, c, d) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 3.0));
    let tri = |v: [Vertex; 3]| Triangle {
        normal: Normal::new([0.0, 0.0, 0.0]),
        vertices: v,
    };
    let mesh = [tri([a, c, b]), tri([a, b, d]), tri([a, d, c]), tri([b, c, d])];
    let mut file = File::create(path).unwrap();
    stl_io::write_stl(&mut file, mesh.iter()).unwrap();
}

#[test]
fn test_stl_is_normalized_and_centred() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("part.stl");
    write_tetrahedron(&path, 10.0);

    let mesh = ProductMesh::load_stl(&path).unwrap();
    assert!(!mesh.placeholder);
    assert_eq!(mesh.triangle_count(), 4);

    let (min, max) = mesh.bounds().unwrap();
    let size = max - min;
    assert!((size.max_element() - 2.0).abs() < 1e-4);
    // z was the longest axis: 30 units map to 2, so x and y become 2/3
    assert!((size.x - 2.0 / 3.0).abs() < 1e-4);
    assert!(((min + max) / 2.0).length() < 1e-4);

    for uv in mesh.vertices.chunks_exact(8).map(|v| (v[6], v[7])) {
        assert!((0.0..=1.0).contains(&uv.0));
        assert!((0.0..=1.0).contains(&uv.1));
    }
}

#[test]
fn test_missing_file_falls_back_to_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let (mesh, err) = ProductMesh::load_or_placeholder(&dir.path().join("absent.stl"));
    assert!(mesh.placeholder);
    assert!(matches!(err, Some(MeshLoadError::Io { .. })));
}

#[test]
fn test_empty_stl_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.stl");
    let mut file = File::create(&path).unwrap();
    stl_io::write_stl(&mut file, std::iter::empty::<&Triangle>()).unwrap();
    drop(file);

    let (mesh, err) = ProductMesh::load_or_placeholder(&path);
    assert!(mesh.placeholder);
    assert!(matches!(
        err,
        Some(MeshLoadError::EmptyMesh { .. }) | Some(MeshLoadError::Parse { .. })
    ));
}

/// One triangle with UVs, its buffer embedded as a data URI; no normals
fn write_triangle_gltf(path: &std::path::Path) {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 2.0, 0.0];
    let uvs: [f32; 6] = [0.1, 0.9, 0.6, 0.9, 0.1, 0.4];
    let bytes: Vec<u8> = positions
        .iter()
        .chain(uvs.iter())
        .flat_map(|f| f.to_le_bytes())
        .collect();
    let gltf = serde_json::json!({
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0, "translation": [10.0, 0.0, 0.0]}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0, "TEXCOORD_0": 1}}]}],
        "buffers": [{
            "byteLength": bytes.len(),
            "uri": format!(
                "data:application/octet-stream;base64,{}",
                general_purpose::STANDARD.encode(&bytes)
            )
        }],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 24}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0.0, 0.0, 0.0], "max": [4.0, 2.0, 0.0]},
            {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2"}
        ]
    });
    std::fs::write(path, serde_json::to_vec_pretty(&gltf).unwrap()).unwrap();
}

#[test]
fn test_gltf_keeps_its_uvs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.gltf");
    write_triangle_gltf(&path);

    let (mesh, err) = ProductMesh::load_or_placeholder(&path);
    assert!(err.is_none(), "{:?}", err);
    assert!(!mesh.placeholder);
    assert_eq!(mesh.triangle_count(), 1);

    let (min, max) = mesh.bounds().unwrap();
    assert!(((max - min).max_element() - 2.0).abs() < 1e-4);
    assert!(((min + max) / 2.0).length() < 1e-4);

    let uvs: Vec<(f32, f32)> = mesh.vertices.chunks_exact(8).map(|v| (v[6], v[7])).collect();
    let expected = [(0.1, 0.9), (0.6, 0.9), (0.1, 0.4)];
    for (uv, want) in uvs.iter().zip(expected) {
        assert!((uv.0 - want.0).abs() < 1e-6 && (uv.1 - want.1).abs() < 1e-6);
    }
    // counter-clockwise in the XY plane, so generated normals face +Z
    for normal in mesh.vertices.chunks_exact(8).map(|v| (v[3], v[4], v[5])) {
        assert!((normal.2 - 1.0).abs() < 1e-5, "{:?}", normal);
    }
}

#[test]
fn test_gltf_from_bytes_matches_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.gltf");
    write_triangle_gltf(&path);

    let from_file = ProductMesh::load(&path).unwrap();
    let from_bytes =
        ProductMesh::from_gltf_bytes(&std::fs::read(&path).unwrap(), "inline").unwrap();
    assert_eq!(from_file, from_bytes);
}

#[test]
fn test_missing_gltf_falls_back_to_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let (mesh, err) = ProductMesh::load_or_placeholder(&dir.path().join("scene.gltf"));
    assert!(mesh.placeholder);
    assert!(matches!(err, Some(MeshLoadError::Io { .. })));
}
