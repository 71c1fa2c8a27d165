//! The bus itself.
//!
//! Editor components hold an `Arc<EventBus>`; the process-wide instance from
//! [`event_bus`] is only the default when nobody injects one, so every test
//! session can run on a private bus.

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use super::events::{EditorEvent, EventCategory};

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Which events a handler wants
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    #[default]
    All,
    /// Any of these categories
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    pub fn matches(&self, event: &EditorEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Capacity of the broadcast channel behind [`EventBus::receiver`]
    pub channel_capacity: usize,
    /// Keep published events for [`EventBus::history`]
    pub enable_history: bool,
    /// Most events kept
    pub history_limit: usize,
    /// Oldest event kept
    pub history_window: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            enable_history: false,
            history_limit: 512,
            history_window: Duration::from_secs(600),
        }
    }
}

impl EventBusConfig {
    /// Keep history; what tests use to inspect emitted events
    pub fn recording() -> Self {
        Self {
            enable_history: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EventBusError {
    /// Nobody was listening; the event was only recorded (if at all)
    #[error("No active subscribers")]
    NoSubscribers,
}

type Handler = Box<dyn Fn(&EditorEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    filter: EventFilter,
    handler: Handler,
}

struct Recorded {
    at: Instant,
    event: EditorEvent,
}

/// Publish/subscribe hub for [`EditorEvent`]s
pub struct EventBus {
    config: EventBusConfig,
    sender: broadcast::Sender<EditorEvent>,
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
    recorded: Mutex<VecDeque<Recorded>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            config,
            sender,
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            recorded: Mutex::new(VecDeque::new()),
        }
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    /// Deliver `event` to matching handlers, then to broadcast receivers
    ///
    /// Handlers run on the caller's thread. Returns how many receivers got the
    /// event; `NoSubscribers` when there were neither handlers nor receivers,
    /// which publishers are free to ignore.
    pub fn publish(&self, event: EditorEvent) -> Result<usize, EventBusError> {
        tracing::trace!(category = %event.category(), "{}", event.description());

        if self.config.enable_history {
            self.record(&event);
        }

        let handled = {
            let subscribers = self.subscribers.read();
            subscribers
                .iter()
                .filter(|s| s.filter.matches(&event))
                .for_each(|s| (s.handler)(&event));
            !subscribers.is_empty()
        };

        match self.sender.send(event) {
            Ok(receivers) => Ok(receivers),
            Err(_) if handled => Ok(0),
            Err(_) => Err(EventBusError::NoSubscribers),
        }
    }

    /// Register a handler; keep it short, it runs inside `publish`
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&EditorEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push(Subscriber {
            id,
            filter,
            handler: Box::new(handler),
        });
        tracing::debug!("{} subscribed", id);
        id
    }

    /// Returns whether `id` was subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        before != subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Broadcast receiver for async consumers
    pub fn receiver(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }

    /// Recorded events, oldest first, optionally only those at or after `since`
    ///
    /// Empty unless history is enabled.
    pub fn history(&self, since: Option<Instant>) -> Vec<EditorEvent> {
        self.recorded
            .lock()
            .iter()
            .filter(|r| since.map_or(true, |since| r.at >= since))
            .map(|r| r.event.clone())
            .collect()
    }

    pub fn clear_history(&self) {
        self.recorded.lock().clear();
    }

    fn record(&self, event: &EditorEvent) {
        let now = Instant::now();
        let mut recorded = self.recorded.lock();
        recorded.push_back(Recorded {
            at: now,
            event: event.clone(),
        });
        while recorded.len() > self.config.history_limit
            || recorded
                .front()
                .is_some_and(|r| now.duration_since(r.at) > self.config.history_window)
        {
            recorded.pop_front();
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("recorded", &self.recorded.lock().len())
            .finish()
    }
}

static GLOBAL_BUS: OnceLock<Arc<EventBus>> = OnceLock::new();

/// The process-wide bus, created with default settings on first use
pub fn event_bus() -> Arc<EventBus> {
    GLOBAL_BUS
        .get_or_init(|| Arc::new(EventBus::new()))
        .clone()
}

/// Configure the process-wide bus before anything uses it
///
/// Fails with the rejected configuration when the bus already exists.
pub fn init_event_bus(config: EventBusConfig) -> Result<(), EventBusConfig> {
    let mut rejected = Some(config.clone());
    GLOBAL_BUS.get_or_init(|| {
        rejected = None;
        Arc::new(EventBus::with_config(config))
    });
    match rejected {
        None => Ok(()),
        Some(config) => Err(config),
    }
}
