use atelier_core::constants::FALLBACK_COLORS;
use atelier_core::Color;
use proptest::prelude::*;

#[test]
fn test_fallback_palette_parses() {
    for hex in FALLBACK_COLORS {
        let color: Color = hex.parse().expect("palette colour");
        assert_eq!(color.to_hex(), hex);
    }
}

#[test]
fn test_color_serde_as_hex_string() {
    let color = Color::rgb(0x1e, 0x40, 0xaf);
    let json = serde_json::to_string(&color).unwrap();
    assert_eq!(json, "\"#1e40af\"");

    let back: Color = serde_json::from_str("\"#1E40AF\"").unwrap();
    assert_eq!(back, color);

    assert!(serde_json::from_str::<Color>("\"blue\"").is_err());
}

proptest! {
    #[test]
    fn prop_hex_round_trip(r in any::<u8>(), g in any::<u8>(), b in any::<u8>(), a in any::<u8>()) {
        let color = Color::rgba(r, g, b, a);
        prop_assert_eq!(Color::parse_hex(&color.to_hex()).ok(), Some(color));
    }
}
