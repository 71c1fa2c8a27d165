use std::sync::Arc;

use atelier_core::{EditorEvent, RenderEvent};
use atelier_designer::{
    CompletionOutcome, Compositor, DecodeCompletion, DesignElement, ElementPatch, ImageDecoder,
    PassStart, RenderOptions, ShapeKind, TextureFrame,
};

use crate::support::{events, png_data_uri, recording_bus};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn compositor() -> (Compositor, Arc<atelier_core::EventBus>) {
    let bus = recording_bus();
    (
        Compositor::with_event_bus(RenderOptions::default(), bus.clone()),
        bus,
    )
}

fn rect(id: &str, x: f64, y: f64, size: f64, fill: &str, z: i32) -> DesignElement {
    let element = DesignElement::shape(ShapeKind::Rectangle)
        .with_id(id)
        .at(x, y)
        .sized(size, size)
        .with_z(z);
    ElementPatch::new().fill_color(fill).apply_to(&element).unwrap()
}

fn without_stroke(element: DesignElement) -> DesignElement {
    match element {
        DesignElement::Shape(mut shape) => {
            shape.stroke_color = None;
            shape.stroke_width = None;
            DesignElement::Shape(shape)
        }
        other => other,
    }
}

fn image(id: &str, x: f64, y: f64, size: f64, rgba: [u8; 4], z: i32) -> DesignElement {
    DesignElement::image(png_data_uri(4, 4, rgba))
        .with_id(id)
        .at(x, y)
        .sized(size, size)
        .with_z(z)
}

/// Bilinear sampling may round a channel by one
fn assert_color(frame: &TextureFrame, x: u32, y: u32, expected: [u8; 4]) {
    let actual = frame.pixel(x, y).unwrap();
    let close = actual
        .iter()
        .zip(expected)
        .all(|(a, e)| (*a as i16 - e as i16).abs() <= 2);
    assert!(close, "pixel ({}, {}) is {:?}, expected {:?}", x, y, actual, expected);
}

fn pending(start: PassStart) -> (u64, Vec<atelier_designer::DecodeRequest>) {
    match start {
        PassStart::Pending {
            generation,
            requests,
        } => (generation, requests),
        other => panic!("expected a pending pass, got {:?}", other),
    }
}

fn ready(outcome: CompletionOutcome) -> TextureFrame {
    match outcome {
        CompletionOutcome::Ready(frame) => frame,
        other => panic!("expected a finished pass, got {:?}", other),
    }
}

#[test]
fn test_empty_stack_signals_no_texture() {
    let (mut compositor, bus) = compositor();
    let start = compositor.begin_pass(&[], (256, 256));

    assert!(matches!(start, PassStart::NoTexture { .. }));
    assert!(compositor.last_frame().is_none());
    assert!(events(&bus)
        .iter()
        .any(|e| matches!(e, EditorEvent::Render(RenderEvent::TextureCleared { .. }))));
    assert!(!events(&bus)
        .iter()
        .any(|e| matches!(e, EditorEvent::Render(RenderEvent::TexturePublished { .. }))));
}

#[test]
fn test_all_hidden_publishes_transparent_raster() {
    let (mut compositor, _) = compositor();
    let mut hidden = rect("r", 0.0, 0.0, 10.0, "#ff0000", 1);
    hidden.common_mut().visible = false;

    let frame = compositor.render_blocking(&[hidden], (32, 32)).unwrap();
    assert!(frame.is_transparent());
}

#[test]
fn test_circle_uses_short_side_and_centre_anchor() {
    let (mut compositor, _) = compositor();
    let circle = without_stroke(
        DesignElement::shape(ShapeKind::Circle)
            .at(50.0, 50.0)
            .sized(100.0, 60.0),
    );

    let frame = compositor.render_blocking(&[circle], (128, 128)).unwrap();

    assert_eq!(frame.alpha_at(50, 50), 255);
    assert_eq!(frame.alpha_at(75, 50), 255);
    assert_eq!(frame.alpha_at(50, 75), 255);
    assert_eq!(frame.alpha_at(85, 50), 0);
    assert_eq!(frame.alpha_at(50, 85), 0);
    assert_eq!(frame.alpha_at(15, 50), 0);

    let (x0, y0, x1, y1) = frame.ink_bounds().unwrap();
    assert!((19..=21).contains(&x0), "left edge {}", x0);
    assert!((79..=81).contains(&x1), "right edge {}", x1);
    assert!((19..=21).contains(&y0), "top edge {}", y0);
    assert!((79..=81).contains(&y1), "bottom edge {}", y1);
}

#[test]
fn test_rectangle_uses_top_left_anchor() {
    let (mut compositor, _) = compositor();
    let square = without_stroke(rect("r", 50.0, 50.0, 20.0, "#ff0000", 1));

    let frame = compositor.render_blocking(&[square], (128, 128)).unwrap();
    assert_eq!(frame.ink_bounds(), Some((50, 50, 69, 69)));
}

#[test]
fn test_higher_z_paints_on_top_regardless_of_insertion() {
    let (mut compositor, _) = compositor();
    let top = without_stroke(rect("top", 10.0, 10.0, 30.0, "#ff0000", 2));
    let bottom = without_stroke(rect("bottom", 20.0, 20.0, 30.0, "#0000ff", 1));

    let frame = compositor.render_blocking(&[top, bottom], (64, 64)).unwrap();
    assert_eq!(frame.pixel(30, 30), Some(RED));
    assert_eq!(frame.pixel(45, 45), Some(BLUE));
}

#[test]
fn test_equal_z_keeps_insertion_order() {
    let (mut compositor, _) = compositor();
    let first = without_stroke(rect("first", 10.0, 10.0, 30.0, "#ff0000", 1));
    let second = without_stroke(rect("second", 20.0, 20.0, 30.0, "#0000ff", 1));

    let frame = compositor.render_blocking(&[first, second], (64, 64)).unwrap();
    assert_eq!(frame.pixel(30, 30), Some(BLUE));
}

#[test]
fn test_opacity_is_local_to_the_element() {
    let (mut compositor, _) = compositor();
    let base = without_stroke(rect("base", 0.0, 0.0, 40.0, "#0000ff", 1));
    let veil = without_stroke(rect("veil", 20.0, 0.0, 40.0, "#ff0000", 2));
    let veil = ElementPatch::new().opacity(0.5).apply_to(&veil).unwrap();

    let frame = compositor.render_blocking(&[base, veil], (64, 64)).unwrap();

    // over the opaque base: half red, half blue, fully opaque
    let [r, _, b, a] = frame.pixel(30, 10).unwrap();
    assert_eq!(a, 255);
    assert!((120..=136).contains(&r), "red {}", r);
    assert!((120..=136).contains(&b), "blue {}", b);

    // over nothing: the veil's own alpha, not compounded
    let [r, _, _, a] = frame.pixel(50, 10).unwrap();
    assert!((126..=129).contains(&a), "alpha {}", a);
    assert_eq!(r, 255);
}

#[test]
fn test_image_centred_and_scaled() {
    let (mut compositor, _) = compositor();
    let picture = image("img", 32.0, 32.0, 16.0, RED, 1);

    let frame = compositor.render_blocking(&[picture], (64, 64)).unwrap();
    assert_color(&frame, 32, 32, RED);
    assert_eq!(frame.ink_bounds(), Some((24, 24, 39, 39)));
}

#[test]
fn test_failed_decode_completes_pass() {
    let (mut compositor, bus) = compositor();
    let broken = DesignElement::image("data:image/png;base64,bm90IGFuIGltYWdl")
        .with_id("broken")
        .at(32.0, 32.0)
        .sized(16.0, 16.0);
    let marker = without_stroke(rect("marker", 0.0, 0.0, 8.0, "#ff0000", 0));

    let (_, requests) = pending(compositor.begin_pass(&[broken, marker], (64, 64)));
    assert_eq!(compositor.pending_count(), 1);

    let completion = requests.into_iter().next().unwrap().run();
    assert!(completion.result.is_err());
    let frame = ready(compositor.complete_decode(completion));

    assert_eq!(compositor.pending_count(), 0);
    assert_eq!(frame.alpha_at(32, 32), 0);
    assert_eq!(frame.pixel(4, 4), Some(RED));
    assert!(events(&bus)
        .iter()
        .any(|e| matches!(e, EditorEvent::Render(RenderEvent::DecodeFailed { .. }))));
}

#[test]
fn test_paint_order_ignores_decode_arrival_order() {
    let elements = vec![
        image("a", 20.0, 20.0, 24.0, RED, 2),
        image("b", 28.0, 28.0, 24.0, BLUE, 1),
    ];

    let (mut forward, _) = compositor();
    let (_, requests) = pending(forward.begin_pass(&elements, (48, 48)));
    let completions: Vec<DecodeCompletion> = requests.into_iter().map(|r| r.run()).collect();

    let (mut backward, _) = compositor();
    let (_, backward_requests) = pending(backward.begin_pass(&elements, (48, 48)));
    let mut backward_completions: Vec<DecodeCompletion> =
        backward_requests.into_iter().map(|r| r.run()).collect();
    backward_completions.reverse();

    let mut forward_frame = None;
    for c in completions {
        if let CompletionOutcome::Ready(frame) = forward.complete_decode(c) {
            forward_frame = Some(frame);
        }
    }
    let mut backward_frame = None;
    for c in backward_completions {
        if let CompletionOutcome::Ready(frame) = backward.complete_decode(c) {
            backward_frame = Some(frame);
        }
    }

    let forward_frame = forward_frame.unwrap();
    let backward_frame = backward_frame.unwrap();
    assert!(forward_frame.same_pixels(&backward_frame));
    // overlap shows the z=2 image
    assert_color(&forward_frame, 24, 24, RED);
}

#[test]
fn test_pending_count_reaches_zero_only_at_last_decode() {
    let (mut compositor, bus) = compositor();
    let elements = vec![
        image("a", 8.0, 8.0, 8.0, RED, 1),
        image("b", 24.0, 24.0, 8.0, BLUE, 2),
    ];
    let (_, requests) = pending(compositor.begin_pass(&elements, (32, 32)));
    let mut completions = requests.into_iter().map(|r| r.run());

    let first = compositor.complete_decode(completions.next().unwrap());
    assert!(matches!(first, CompletionOutcome::Pending { remaining: 1 }));
    assert!(!events(&bus)
        .iter()
        .any(|e| matches!(e, EditorEvent::Render(RenderEvent::TexturePublished { .. }))));

    ready(compositor.complete_decode(completions.next().unwrap()));
    assert_eq!(compositor.pending_count(), 0);
}

#[test]
fn test_superseded_pass_never_publishes() {
    let (mut compositor, bus) = compositor();
    let old = vec![image("img", 16.0, 16.0, 16.0, RED, 1)];
    let new = vec![image("img", 16.0, 16.0, 16.0, BLUE, 1)];

    let (old_generation, old_requests) = pending(compositor.begin_pass(&old, (32, 32)));
    let (new_generation, new_requests) = pending(compositor.begin_pass(&new, (32, 32)));
    assert!(new_generation > old_generation);

    let stale = old_requests.into_iter().next().unwrap().run();
    assert!(matches!(
        compositor.complete_decode(stale),
        CompletionOutcome::Stale
    ));
    assert_eq!(compositor.pending_count(), 1);

    let frame = ready(compositor.complete_decode(new_requests.into_iter().next().unwrap().run()));
    assert_eq!(frame.generation, new_generation);
    assert_color(&frame, 16, 16, BLUE);

    let published: Vec<u64> = events(&bus)
        .iter()
        .filter_map(|e| match e {
            EditorEvent::Render(RenderEvent::TexturePublished { generation, .. }) => {
                Some(*generation)
            }
            _ => None,
        })
        .collect();
    assert_eq!(published, vec![new_generation]);
}

#[test]
fn test_rendering_is_idempotent() {
    let (mut compositor, _) = compositor();
    let elements = vec![
        image("img", 20.0, 20.0, 20.0, RED, 1),
        DesignElement::shape(ShapeKind::Star)
            .with_id("star")
            .at(10.0, 10.0)
            .sized(30.0, 30.0)
            .with_z(2),
    ];

    let first = compositor.render_blocking(&elements, (48, 48)).unwrap();
    let second = compositor.render_blocking(&elements, (48, 48)).unwrap();
    assert!(first.same_pixels(&second));
    assert_ne!(first.generation, second.generation);
}

#[tokio::test]
async fn test_background_decoder_fan_in() {
    let (mut compositor, _) = compositor();
    let (decoder, mut completions) = ImageDecoder::channel();
    let elements = vec![
        image("a", 8.0, 8.0, 8.0, RED, 1),
        image("b", 24.0, 24.0, 8.0, BLUE, 2),
        image("c", 16.0, 16.0, 4.0, RED, 3),
    ];

    let (_, requests) = pending(compositor.begin_pass(&elements, (32, 32)));
    decoder.dispatch(requests);

    let mut frame = None;
    while frame.is_none() {
        let completion = completions.recv().await.unwrap();
        if let CompletionOutcome::Ready(f) = compositor.complete_decode(completion) {
            frame = Some(f);
        }
    }

    let frame = frame.unwrap();
    assert_color(&frame, 8, 8, RED);
    assert_color(&frame, 24, 24, BLUE);
    assert_eq!(compositor.pending_count(), 0);
}
