//! Periodic draft saving.
//!
//! The autosave task reads the session under a read lock. The only thing it
//! writes back is the design id the store assigned to a first save, so later
//! saves from either path update that same design. It never touches the layer
//! stack, and a failed save is simply retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use atelier_core::{event_bus, DesignId, EditorEvent, EventBus, PersistenceEvent, ThreadSafeRw};
use atelier_settings::AutosaveSettings;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::persistence::DesignStore;
use crate::serialization::Visibility;
use crate::session::EditorSession;

/// Whether the user may currently save
pub type SessionCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// What one autosave tick should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveDecision {
    Save,
    Skip(&'static str),
}

/// When autosave runs and what it requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosavePolicy {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self::from(&AutosaveSettings::default())
    }
}

impl From<&AutosaveSettings> for AutosavePolicy {
    fn from(settings: &AutosaveSettings) -> Self {
        Self {
            enabled: settings.enabled,
            interval: settings.interval(),
        }
    }
}

impl AutosavePolicy {
    pub fn decide(&self, elements: usize, authenticated: bool) -> AutosaveDecision {
        if !self.enabled {
            AutosaveDecision::Skip("autosave disabled")
        } else if elements == 0 {
            AutosaveDecision::Skip("design is empty")
        } else if !authenticated {
            AutosaveDecision::Skip("user session is not valid")
        } else {
            AutosaveDecision::Save
        }
    }

    pub fn should_save(&self, elements: usize, authenticated: bool) -> bool {
        self.decide(elements, authenticated) == AutosaveDecision::Save
    }
}

/// Running autosave task; aborted on [`AutosaveHandle::abort`] or drop
#[derive(Debug)]
pub struct AutosaveHandle {
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start the autosave timer for `session`
///
/// The first tick fires one interval after the call. Events go to the
/// process-wide bus; see [`spawn_autosave_with_event_bus`].
pub fn spawn_autosave(
    session: ThreadSafeRw<EditorSession>,
    store: Arc<dyn DesignStore>,
    session_valid: SessionCheck,
    policy: AutosavePolicy,
) -> AutosaveHandle {
    spawn_autosave_with_event_bus(session, store, session_valid, policy, event_bus())
}

pub fn spawn_autosave_with_event_bus(
    session: ThreadSafeRw<EditorSession>,
    store: Arc<dyn DesignStore>,
    session_valid: SessionCheck,
    policy: AutosavePolicy,
    events: Arc<EventBus>,
) -> AutosaveHandle {
    let period = policy.interval.max(Duration::from_millis(1));
    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let emit = |event: PersistenceEvent| {
            let _ = events.publish(EditorEvent::Persistence(event));
        };

        loop {
            ticker.tick().await;

            let (document, known_id) = {
                let session = session.read();
                (
                    session.to_document(Visibility::Draft),
                    session.design_id().cloned(),
                )
            };

            if let AutosaveDecision::Skip(reason) =
                policy.decide(document.elements.len(), session_valid())
            {
                debug!("Autosave skipped: {}", reason);
                emit(PersistenceEvent::AutosaveSkipped {
                    reason: reason.to_string(),
                });
                continue;
            }

            match store.save(&document, known_id.as_ref()).await {
                Ok(id) => {
                    info!("Autosaved design {} ({} elements)", id, document.elements.len());
                    emit(PersistenceEvent::Saved {
                        design_id: id.clone(),
                        elements: document.elements.len(),
                        is_public: false,
                        autosave: true,
                        at: Utc::now(),
                    });
                    adopt_design_id(&session, id);
                }
                Err(err) => {
                    error!("Autosave failed: {}", err);
                    emit(PersistenceEvent::SaveFailed {
                        reason: err.to_string(),
                        autosave: true,
                    });
                }
            }
        }
    });
    AutosaveHandle { task }
}

/// Record the id of a first save unless a manual save got there first
fn adopt_design_id(session: &ThreadSafeRw<EditorSession>, id: DesignId) {
    let mut session = session.write();
    if session.design_id().is_none() {
        session.set_design_id(Some(id));
    }
}

/// Save the session now and remember the identifier the store assigned
pub async fn save_session(
    session: &ThreadSafeRw<EditorSession>,
    store: &dyn DesignStore,
    visibility: Visibility,
    events: &EventBus,
) -> Result<DesignId, atelier_core::PersistenceError> {
    let (document, known_id) = {
        let session = session.read();
        (session.to_document(visibility), session.design_id().cloned())
    };
    match store.save(&document, known_id.as_ref()).await {
        Ok(id) => {
            session.write().set_design_id(Some(id.clone()));
            let _ = events.publish(EditorEvent::Persistence(PersistenceEvent::Saved {
                design_id: id.clone(),
                elements: document.elements.len(),
                is_public: document.is_public,
                autosave: false,
                at: Utc::now(),
            }));
            Ok(id)
        }
        Err(err) => {
            error!("Saving design failed: {}", err);
            let _ = events.publish(EditorEvent::Persistence(PersistenceEvent::SaveFailed {
                reason: err.to_string(),
                autosave: false,
            }));
            Err(err)
        }
    }
}
