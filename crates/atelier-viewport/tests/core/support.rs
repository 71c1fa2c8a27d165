#![allow(dead_code)]

use std::sync::Arc;

use atelier_core::{EditorEvent, EventBus, EventBusConfig, ViewportEvent};
use atelier_designer::Product;
use atelier_settings::CameraSettings;
use atelier_viewport::{HeadlessBackend, ViewportController};

pub fn recording_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_config(EventBusConfig::recording()))
}

pub fn viewport_events(bus: &EventBus) -> Vec<ViewportEvent> {
    bus.history(None)
        .into_iter()
        .filter_map(|e| match e {
            EditorEvent::Viewport(v) => Some(v),
            _ => None,
        })
        .collect()
}

pub fn tshirt() -> Product {
    serde_json::from_str(include_str!("../fixtures/product_tshirt.json")).unwrap()
}

pub fn viewport(bus: Arc<EventBus>) -> ViewportController<HeadlessBackend> {
    ViewportController::with_event_bus(HeadlessBackend::new(), &CameraSettings::default(), bus)
}
