use std::path::Path;
use std::sync::Arc;

use atelier_core::{Color, Size, ViewportError, ViewportEvent};
use atelier_designer::{EditorSession, ShapeKind, SharedTextureSink};
use atelier_settings::EditorConfig;
use atelier_viewport::{HeadlessBackend, ViewportController, ViewportState};
use parking_lot::Mutex;

use crate::support::{recording_bus, tshirt, viewport, viewport_events};

#[test]
fn test_missing_model_still_becomes_ready() {
    let bus = recording_bus();
    let mut vp = viewport(bus.clone());

    let failure = vp.load(Path::new("models/does-not-exist.stl")).unwrap();
    assert!(failure.is_some());
    assert_eq!(vp.state(), ViewportState::Ready);
    assert!(vp.mesh().unwrap().placeholder);
    assert!(vp.backend().mesh().is_some());

    let events = viewport_events(&bus);
    assert!(events
        .iter()
        .any(|e| matches!(e, ViewportEvent::MeshFallback { .. })));
    let states: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ViewportEvent::StateChanged { to, .. } => Some(to.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(states, ["Loading", "Ready"]);
}

#[test]
fn test_color_and_texture_are_independent() {
    let bus = recording_bus();
    let mut vp = viewport(bus.clone());
    vp.load(Path::new("tshirt.glb")).unwrap();

    let red = Color::parse_hex("#ef4444").unwrap();
    assert!(vp.apply_color(red).unwrap());

    let mut session = EditorSession::open(tshirt(), EditorConfig::default());
    session.add_shape(ShapeKind::Circle).unwrap();
    let frame = session.render_blocking().unwrap();

    let uploads = vp.backend().upload_count();
    let handle = vp.publish_texture(&frame).unwrap();
    assert_eq!(vp.material().base_color, red);
    assert_eq!(vp.backend().upload_count(), uploads + 1);

    // recolouring twice leaves texture and upload count alone
    assert!(vp.apply_color(Color::BLACK).unwrap());
    assert!(!vp.apply_color(Color::BLACK).unwrap());
    assert_eq!(vp.texture_handle(), Some(handle));
    assert_eq!(vp.backend().upload_count(), uploads + 1);

    let colors: Vec<_> = viewport_events(&bus)
        .into_iter()
        .filter(|e| matches!(e, ViewportEvent::ColorApplied { .. }))
        .collect();
    assert_eq!(colors.len(), 2);
}

#[test]
fn test_texture_updates_in_place() {
    let mut vp = viewport(recording_bus());
    vp.load(Path::new("none.stl")).unwrap();

    let mut session = EditorSession::open(tshirt(), EditorConfig::default());
    session.add_shape(ShapeKind::Rectangle).unwrap();
    let first = session.render_blocking().unwrap();
    let handle = vp.publish_texture(&first).unwrap();

    session.add_shape(ShapeKind::Star).unwrap();
    let second = session.render_blocking().unwrap();
    assert_eq!(vp.publish_texture(&second).unwrap(), handle);

    assert_eq!(vp.texture_revision(), 2);
    assert_eq!(vp.backend().allocation_count(), 1);
    assert_eq!(vp.backend().live_textures(), 1);
    assert_eq!(
        vp.backend().texture_generation(handle),
        Some(second.generation)
    );

    // a different canvas size reallocates storage behind the same handle
    let mut product = tshirt();
    product.texture_areas[0].canvas_size = Size::new(64.0, 64.0);
    let mut small = EditorSession::open(product, EditorConfig::default());
    small.add_shape(ShapeKind::Triangle).unwrap();
    let resized = small.render_blocking().unwrap();
    assert_eq!(resized.width, 64);
    assert_eq!(vp.publish_texture(&resized).unwrap(), handle);
    assert_eq!(vp.backend().allocation_count(), 2);
}

#[test]
fn test_session_drives_viewport_through_sink() {
    let bus = recording_bus();
    let vp = Arc::new(Mutex::new(viewport(bus.clone())));
    vp.lock().load(Path::new("missing.stl")).unwrap();

    let mut session = EditorSession::open(tshirt(), EditorConfig::default());
    let sink: SharedTextureSink = vp.clone();
    session.attach_sink(sink);

    let id = session.add_shape(ShapeKind::Circle).unwrap();
    session.render_blocking();
    assert!(vp.lock().texture_handle().is_some());

    session.remove(&id);
    session.render_blocking();
    assert!(vp.lock().texture_handle().is_none());
    assert_eq!(vp.lock().backend().live_textures(), 0);

    let events = viewport_events(&bus);
    assert!(events
        .iter()
        .any(|e| matches!(e, ViewportEvent::TextureBound { revision: 1 })));
    assert!(events.contains(&ViewportEvent::TextureReleased));
}

#[test]
fn test_render_uses_camera_and_material() {
    let mut vp = viewport(recording_bus());
    vp.load(Path::new("missing.stl")).unwrap();

    vp.render_frame(16.0 / 9.0).unwrap();
    let before = vp.backend().last_draw().unwrap().view;

    assert_eq!(vp.zoom_in().unwrap(), 3.5);
    vp.render_frame(16.0 / 9.0).unwrap();
    assert_ne!(vp.backend().last_draw().unwrap().view, before);

    vp.reset_camera().unwrap();
    vp.render_frame(16.0 / 9.0).unwrap();
    assert_eq!(vp.backend().last_draw().unwrap().view, before);
    assert_eq!(vp.backend().frames_drawn(), 3);
}

#[test]
fn test_dispose_releases_everything() {
    let mut vp: ViewportController<HeadlessBackend> = viewport(recording_bus());
    assert!(matches!(
        vp.render_frame(1.0),
        Err(ViewportError::InvalidStateTransition { .. })
    ));
    vp.load(Path::new("missing.stl")).unwrap();

    let mut session = EditorSession::open(tshirt(), EditorConfig::default());
    session.add_shape(ShapeKind::Circle).unwrap();
    let frame = session.render_blocking().unwrap();
    vp.publish_texture(&frame).unwrap();

    vp.dispose().unwrap();
    assert_eq!(vp.backend().live_textures(), 0);
    assert!(vp.backend().mesh().is_none());
    assert_eq!(vp.publish_texture(&frame), Err(ViewportError::Disposed));
    assert_eq!(vp.apply_color(Color::WHITE), Err(ViewportError::Disposed));
}
