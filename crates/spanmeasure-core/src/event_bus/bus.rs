//! Event bus
//!
//! Two ways to listen: a filtered callback that runs on the measurement loop
//! as the event is published, or a broadcast receiver drained by another task.
//! A receiver that falls more than the channel capacity behind loses the
//! oldest events.

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::events::{EventCategory, MeasureEvent};

/// Default number of events a lagging receiver can fall behind
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Which events a callback wants
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Every event
    #[default]
    All,
    /// Events in any of these categories
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &MeasureEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

struct Listener {
    filter: EventFilter,
    callback: Box<dyn Fn(&MeasureEvent) + Send + Sync>,
}

/// Fan-out of [`MeasureEvent`]s from a measurement loop
pub struct EventBus {
    sender: broadcast::Sender<MeasureEvent>,
    listeners: RwLock<Vec<Listener>>,
}

impl EventBus {
    /// Create a bus with the default channel capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus whose receivers may lag by up to `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Deliver `event` to matching callbacks and to every receiver
    ///
    /// Returns how many listeners saw it.
    pub fn publish(&self, event: MeasureEvent) -> usize {
        let mut delivered = 0;
        for listener in self.listeners.read().iter() {
            if listener.filter.matches(&event) {
                (listener.callback)(&event);
                delivered += 1;
            }
        }

        let description = event.description();
        delivered += self.sender.send(event).unwrap_or(0);
        tracing::trace!("{} delivered to {} listener(s)", description, delivered);
        delivered
    }

    /// Register a callback for events passing `filter`
    ///
    /// The callback runs on the publishing task and must return quickly.
    /// It must not subscribe from within the callback.
    pub fn subscribe<F>(&self, filter: EventFilter, callback: F)
    where
        F: Fn(&MeasureEvent) + Send + Sync + 'static,
    {
        self.listeners.write().push(Listener {
            filter,
            callback: Box::new(callback),
        });
    }

    /// Receiver for consuming events from another task
    pub fn receiver(&self) -> broadcast::Receiver<MeasureEvent> {
        self.sender.subscribe()
    }

    /// Number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.listeners.read().len()
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
            .field("callbacks", &self.callback_count())
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}
