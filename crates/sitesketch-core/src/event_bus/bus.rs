//! Event Bus implementation.
//!
//! Handlers run synchronously on the publishing thread, in subscription
//! order, outside the handler lock, so a handler may publish or
//! (un)subscribe. Async consumers poll a broadcast receiver instead.

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use super::events::{AppEvent, EventCategory};

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Which events a handler receives
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    #[default]
    All,
    /// Events of any of these categories
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

type Handler = Arc<dyn Fn(&AppEvent) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    handler: Handler,
}

/// Configuration for the event bus
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Broadcast buffer; slow receivers lag past this many events.
    pub channel_capacity: usize,
    /// Record published events for [`EventBus::history`].
    pub enable_history: bool,
    pub max_history_size: usize,
    /// Entries older than this are pruned on the next publish.
    pub history_retention: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            enable_history: false,
            max_history_size: 1000,
            history_retention: Duration::from_secs(300),
        }
    }
}

struct Recorded {
    at: Instant,
    event: AppEvent,
}

/// Application-wide event distribution
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
    subscriptions: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
    history: Mutex<VecDeque<Recorded>>,
    config: EventBusConfig,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            subscriptions: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            history: Mutex::new(VecDeque::new()),
            config,
        }
    }

    /// Deliver `event` to matching handlers and every receiver.
    ///
    /// Returns how many handlers and receivers got it. History is recorded
    /// even when nobody listens.
    pub fn publish(&self, event: AppEvent) -> usize {
        tracing::trace!("event: {}", event.description());
        if self.config.enable_history {
            self.record(&event);
        }

        let handlers: Vec<Handler> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.filter.matches(&event))
            .map(|s| Arc::clone(&s.handler))
            .collect();
        for handler in &handlers {
            handler(&event);
        }

        handlers.len() + self.sender.send(event).unwrap_or(0)
    }

    /// Publish without caring who listens
    pub fn notify(&self, event: AppEvent) {
        self.publish(event);
    }

    /// Register a handler. It must return quickly.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions.write().push(Subscription {
            id,
            filter,
            handler: Arc::new(handler),
        });
        tracing::debug!("Subscription {} added", id);
        id
    }

    pub fn receiver(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        let removed = subscriptions.len() < before;
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Recorded events, oldest first, optionally only those at or after `since`.
    ///
    /// Empty when history is disabled.
    pub fn history(&self, since: Option<Instant>) -> Vec<AppEvent> {
        self.history
            .lock()
            .iter()
            .filter(|r| since.is_none_or(|since| r.at >= since))
            .map(|r| r.event.clone())
            .collect()
    }

    /// Recorded events accepted by `filter`, oldest first
    pub fn history_matching(&self, filter: &EventFilter) -> Vec<AppEvent> {
        self.history
            .lock()
            .iter()
            .filter(|r| filter.matches(&r.event))
            .map(|r| r.event.clone())
            .collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    fn record(&self, event: &AppEvent) {
        let now = Instant::now();
        let mut history = self.history.lock();
        history.push_back(Recorded {
            at: now,
            event: event.clone(),
        });

        let retention = self.config.history_retention;
        while history
            .front()
            .is_some_and(|r| now.duration_since(r.at) > retention)
        {
            history.pop_front();
        }
        let excess = history.len().saturating_sub(self.config.max_history_size);
        history.drain(..excess);
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
            .field("recorded", &self.history.lock().len())
            .finish()
    }
}
