#![allow(dead_code)]

use std::sync::Arc;

use atelier_core::{EditorEvent, EventBus, EventBusConfig};
use atelier_designer::{Product, TextureFrame, TextureSink};
use base64::{engine::general_purpose, Engine as _};

pub fn recording_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_config(EventBusConfig::recording()))
}

pub fn events(bus: &EventBus) -> Vec<EditorEvent> {
    bus.history(None)
}

pub fn tshirt() -> Product {
    serde_json::from_str(include_str!("../fixtures/product_tshirt.json")).unwrap()
}

/// Solid-colour PNG as a data URI
pub fn png_data_uri(width: u32, height: u32, rgba: [u8; 4]) -> String {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub frames: Vec<TextureFrame>,
    pub clears: usize,
}

impl TextureSink for RecordingSink {
    fn publish(&mut self, frame: &TextureFrame) {
        self.frames.push(frame.clone());
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}
