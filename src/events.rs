//! Sink observability events
//!
//! The sink reports each write outcome to registered listeners, mirroring
//! the logged/error notifications a logging-framework transport emits.
//! Listeners run synchronously on the write path and should be cheap.

use std::fmt;

use parking_lot::RwLock;

/// Outcome notification for one write attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// The entry was persisted into `segment`
    Logged {
        /// Segment that received the entry
        segment: String,
    },
    /// The write failed
    Error {
        /// Rendered failure
        message: String,
    },
}

/// Registered event callback.
pub type EventListener = Box<dyn Fn(&SinkEvent) + Send + Sync>;

/// Listener registry for sink events.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<EventListener>>,
}

impl EventBus {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every subsequent event.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&SinkEvent) + Send + Sync + 'static,
    {
        self.listeners.write().push(Box::new(listener));
    }

    /// Deliver an event to every listener.
    pub(crate) fn emit(&self, event: &SinkEvent) {
        for listener in self.listeners.read().iter() {
            listener(event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
