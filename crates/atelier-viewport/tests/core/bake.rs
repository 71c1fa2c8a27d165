use atelier_core::Color;
use atelier_designer::{DesignElement, EditorSession, ShapeKind};
use atelier_settings::EditorConfig;
use atelier_viewport::{bake_atlas, HeadlessBackend, ProductMesh, RenderBackend};

use crate::support::tshirt;

#[test]
fn test_atlas_covers_every_area() {
    let product = tshirt();
    let front = product.texture_areas[0].clone();
    let atlas = bake_atlas(&product, &front, Color::rgb(16, 185, 129), None).unwrap();
    assert_eq!(atlas.dimensions(), (1024, 512));
    assert_eq!(atlas.get_pixel(700, 300).0, [16, 185, 129, 255]);
}

#[test]
fn test_texture_lands_in_uv_rect() {
    let product = tshirt();
    let back = product.texture_areas[1].clone();

    let mut session = EditorSession::open(product.clone(), EditorConfig::default());
    session.select_texture_area("back").unwrap();
    session
        .add_element(
            DesignElement::shape(ShapeKind::Rectangle)
                .at(0.0, 0.0)
                .sized(256.0, 256.0),
        )
        .unwrap();
    let frame = session.render_blocking().unwrap();

    let mut backend = HeadlessBackend::new();
    backend.upload_mesh(&ProductMesh::placeholder()).unwrap();
    let handle = backend.create_texture(&frame).unwrap();
    let texture = backend.texture_pixels(handle).unwrap();

    let atlas = bake_atlas(&product, &back, Color::WHITE, Some(texture)).unwrap();
    // 256px canvas scaled into the 512px back rectangle
    assert_eq!(atlas.get_pixel(100, 100).0, [255, 255, 255, 255]);
    let inside = atlas.get_pixel(512 + 256, 256).0;
    assert_eq!(inside, [0x3b, 0x82, 0xf6, 255]);
}
