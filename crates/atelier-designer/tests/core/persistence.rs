use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use atelier_core::{thread_safe_rw, EditorEvent, PersistenceEvent, ThreadSafeRw};
use atelier_designer::{
    save_session, spawn_autosave_with_event_bus, AutosavePolicy, DesignDocument, DesignStore,
    EditorSession, InMemoryStore, JsonFileStore, SessionCheck, ShapeKind, Visibility,
};
use atelier_settings::EditorConfig;

use crate::support::{events, recording_bus, tshirt};

const TICK: Duration = Duration::from_secs(30);

fn shared_session(bus: &Arc<atelier_core::EventBus>) -> ThreadSafeRw<EditorSession> {
    thread_safe_rw(EditorSession::open_with_event_bus(
        tshirt(),
        EditorConfig::default(),
        bus.clone(),
    ))
}

fn always_valid() -> SessionCheck {
    Arc::new(|| true)
}

fn policy() -> AutosavePolicy {
    AutosavePolicy {
        enabled: true,
        interval: TICK,
    }
}

async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

fn persistence_events(bus: &atelier_core::EventBus) -> Vec<PersistenceEvent> {
    events(bus)
        .into_iter()
        .filter_map(|e| match e {
            EditorEvent::Persistence(p) => Some(p),
            _ => None,
        })
        .collect()
}

#[test]
fn test_fixture_document_loads() {
    let doc: DesignDocument =
        serde_json::from_str(include_str!("../fixtures/design_badge.json")).unwrap();
    let mut session = EditorSession::open_with_event_bus(tshirt(), EditorConfig::default(), recording_bus());
    session.load_document(&doc).unwrap();

    assert_eq!(session.layers().len(), 2);
    assert_eq!(session.product_color(), "#000000");
    let frame = session.render_blocking().unwrap();
    assert_eq!((frame.width, frame.height), (256, 256));
    assert!(!frame.is_transparent());
}

#[tokio::test]
async fn test_publish_and_draft_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let bus = recording_bus();
    let session = shared_session(&bus);
    session.write().add_shape(ShapeKind::Circle).unwrap();

    let id = save_session(&session, &store, Visibility::Draft, &bus)
        .await
        .unwrap();
    assert_eq!(session.read().design_id(), Some(&id));
    assert!(!store.load(&id).await.unwrap().is_public);

    let again = save_session(&session, &store, Visibility::Publish, &bus)
        .await
        .unwrap();
    assert_eq!(again, id);
    let stored = store.load(&id).await.unwrap();
    assert!(stored.is_public);
    assert_eq!(stored.elements, session.read().layers().elements());
}

#[tokio::test]
async fn test_failed_save_keeps_design() {
    let store = InMemoryStore::new();
    store.set_failing(true);
    let bus = recording_bus();
    let session = shared_session(&bus);
    session.write().add_text(None).unwrap();

    assert!(save_session(&session, &store, Visibility::Draft, &bus)
        .await
        .is_err());
    assert_eq!(session.read().layers().len(), 1);
    assert!(session.read().design_id().is_none());
    assert!(persistence_events(&bus)
        .iter()
        .any(|e| matches!(e, PersistenceEvent::SaveFailed { autosave: false, .. })));
}

#[tokio::test(start_paused = true)]
async fn test_autosave_saves_drafts_on_interval() {
    let bus = recording_bus();
    let session = shared_session(&bus);
    session.write().add_shape(ShapeKind::Star).unwrap();
    let store = Arc::new(InMemoryStore::new());

    let handle = spawn_autosave_with_event_bus(
        session.clone(),
        store.clone(),
        always_valid(),
        policy(),
        bus.clone(),
    );

    advance(TICK / 2).await;
    assert_eq!(store.save_count(), 0);

    advance(TICK).await;
    assert_eq!(store.save_count(), 1);

    advance(TICK).await;
    assert_eq!(store.save_count(), 2);
    // repeated autosaves overwrite the same design
    assert_eq!(store.len(), 1);

    handle.abort();
    let saved = persistence_events(&bus)
        .into_iter()
        .filter(|e| matches!(e, PersistenceEvent::Saved { autosave: true, is_public: false, .. }))
        .count();
    assert_eq!(saved, 2);
}

#[tokio::test(start_paused = true)]
async fn test_manual_save_after_autosave_updates_same_design() {
    let bus = recording_bus();
    let session = shared_session(&bus);
    session.write().add_shape(ShapeKind::Circle).unwrap();
    let store = Arc::new(InMemoryStore::new());

    let handle = spawn_autosave_with_event_bus(
        session.clone(),
        store.clone(),
        always_valid(),
        policy(),
        bus.clone(),
    );
    advance(TICK + Duration::from_secs(1)).await;
    handle.abort();
    assert_eq!(store.save_count(), 1);
    let autosaved = session.read().design_id().cloned().expect("id recorded");

    session.write().add_text(None).unwrap();
    let id = save_session(&session, store.as_ref(), Visibility::Publish, &bus)
        .await
        .unwrap();

    assert_eq!(id, autosaved);
    assert_eq!(store.len(), 1);
    let stored = store.load(&id).await.unwrap();
    assert!(stored.is_public);
    assert_eq!(stored.elements.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_autosave_skips_empty_and_signed_out() {
    let bus = recording_bus();
    let session = shared_session(&bus);
    let store = Arc::new(InMemoryStore::new());
    let signed_in = Arc::new(AtomicBool::new(false));
    let check = {
        let signed_in = signed_in.clone();
        Arc::new(move || signed_in.load(Ordering::SeqCst)) as SessionCheck
    };

    let _handle = spawn_autosave_with_event_bus(
        session.clone(),
        store.clone(),
        check,
        policy(),
        bus.clone(),
    );

    // empty design
    advance(TICK + Duration::from_secs(1)).await;
    assert_eq!(store.save_count(), 0);

    // content but no valid session
    session.write().add_shape(ShapeKind::Rectangle).unwrap();
    advance(TICK).await;
    assert_eq!(store.save_count(), 0);

    signed_in.store(true, Ordering::SeqCst);
    advance(TICK).await;
    assert_eq!(store.save_count(), 1);

    let skipped: Vec<String> = persistence_events(&bus)
        .into_iter()
        .filter_map(|e| match e {
            PersistenceEvent::AutosaveSkipped { reason } => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(skipped.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_autosave_retries_after_failure() {
    let bus = recording_bus();
    let session = shared_session(&bus);
    session.write().add_shape(ShapeKind::Circle).unwrap();
    let store = Arc::new(InMemoryStore::new());
    store.set_failing(true);

    let _handle = spawn_autosave_with_event_bus(
        session.clone(),
        store.clone() as Arc<dyn DesignStore>,
        always_valid(),
        policy(),
        bus.clone(),
    );

    advance(TICK + Duration::from_secs(1)).await;
    assert_eq!(store.save_count(), 0);
    assert_eq!(session.read().layers().len(), 1);
    assert!(persistence_events(&bus)
        .iter()
        .any(|e| matches!(e, PersistenceEvent::SaveFailed { autosave: true, .. })));

    store.set_failing(false);
    advance(TICK).await;
    assert_eq!(store.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_autosave() {
    let bus = recording_bus();
    let session = shared_session(&bus);
    session.write().add_shape(ShapeKind::Circle).unwrap();
    let store = Arc::new(InMemoryStore::new());

    let handle = spawn_autosave_with_event_bus(
        session,
        store.clone(),
        always_valid(),
        policy(),
        bus,
    );
    drop(handle);

    advance(TICK * 3).await;
    assert_eq!(store.save_count(), 0);
}
