use atelier_designer::{font_manager, Compositor, DesignElement, ElementPatch, RenderOptions, TextAlign};

use crate::support::recording_bus;

fn text_at(content: &str, x: f64, y: f64, font_size: f64) -> DesignElement {
    let mut element = DesignElement::text(content, "Sans").at(x, y);
    if let DesignElement::Text(text) = &mut element {
        text.font_size = font_size;
        text.color = "#000000".to_string();
    }
    element
}

fn compositor() -> Compositor {
    Compositor::with_event_bus(RenderOptions::default(), recording_bus())
}

#[test]
fn test_text_ink_is_centred_on_position() {
    if !font_manager::has_fonts() {
        eprintln!("no system fonts, skipping");
        return;
    }
    let hi = text_at("HI", 100.0, 100.0, 64.0);

    let frame = compositor().render_blocking(&[hi], (200, 200)).unwrap();
    let (x0, y0, x1, y1) = frame.ink_bounds().expect("glyphs painted");

    assert!(x0 >= 36 && x1 <= 164, "x range {}..{}", x0, x1);
    assert!(y0 >= 36 && y1 <= 164, "y range {}..{}", y0, y1);
    let cx = (x0 + x1) as f64 / 2.0;
    let cy = (y0 + y1) as f64 / 2.0;
    assert!((cx - 100.0).abs() <= 10.0, "ink centred at x {}", cx);
    assert!((cy - 100.0).abs() <= 20.0, "ink centred at y {}", cy);
}

#[test]
fn test_multiline_text_is_taller() {
    if !font_manager::has_fonts() {
        return;
    }
    let one = text_at("AB", 100.0, 100.0, 32.0);
    let two = text_at("AB\nAB", 100.0, 100.0, 32.0);

    let height = |element: DesignElement| {
        let frame = compositor().render_blocking(&[element], (200, 200)).unwrap();
        let (_, y0, _, y1) = frame.ink_bounds().unwrap();
        y1 - y0
    };
    assert!(height(two) > height(one) + 20);
}

#[test]
fn test_alignment_shifts_short_lines() {
    if !font_manager::has_fonts() {
        return;
    }
    let aligned = |align: TextAlign| {
        let mut element = text_at("WWWWWW\nI", 100.0, 100.0, 24.0);
        if let DesignElement::Text(text) = &mut element {
            text.text_align = align;
        }
        let frame = compositor().render_blocking(&[element], (200, 200)).unwrap();
        // left-most ink on the lower half, where only the short line sits
        (100..200)
            .flat_map(|y| (0..200).map(move |x| (x, y)))
            .filter(|&(x, y)| frame.alpha_at(x, y) > 0)
            .map(|(x, _)| x)
            .min()
            .unwrap()
    };
    let left = aligned(TextAlign::Left);
    let center = aligned(TextAlign::Center);
    let right = aligned(TextAlign::Right);
    assert!(left < center && center < right, "{} {} {}", left, center, right);
}

#[test]
fn test_blank_text_paints_nothing() {
    let blank = text_at("   ", 50.0, 50.0, 32.0);
    let frame = compositor().render_blocking(&[blank], (100, 100)).unwrap();
    assert!(frame.is_transparent());

    let faded = ElementPatch::new()
        .opacity(0.0)
        .apply_to(&text_at("HI", 50.0, 50.0, 32.0))
        .unwrap();
    let frame = compositor().render_blocking(&[faded], (100, 100)).unwrap();
    assert!(frame.is_transparent());
}

#[test]
fn test_font_families_listed() {
    if !font_manager::has_fonts() {
        return;
    }
    let families = font_manager::list_font_families();
    assert!(!families.is_empty());
    assert!(families.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_huge_font_size_still_renders_the_rest() {
    if !font_manager::has_fonts() {
        return;
    }
    let small = text_at("HI", 100.0, 100.0, 48.0);
    let huge = text_at("HI", 100.0, 100.0, 200_000.0);

    let frame = compositor()
        .render_blocking(&[huge, small], (200, 200))
        .expect("pass completes");
    let (x0, _, x1, _) = frame.ink_bounds().expect("small text painted");
    assert!(x0 > 0 && x1 < 200, "x range {}..{}", x0, x1);
}
