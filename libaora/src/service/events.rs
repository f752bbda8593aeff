//! Event system for fetch progress and user-visible alerts
//!
//! This module provides an in-process event bus that fetch controllers and
//! services report to. Front ends subscribe to it and surface
//! [`Event::FetchFailed`] as an alert, which is the side channel errors
//! travel on instead of being returned to the screen.
//!
//! # Non-Blocking Behavior
//!
//! If no subscribers exist, events are dropped immediately. Subscribers can
//! lag without blocking emitters.
//!
//! # Example
//!
//! ```no_run
//! use libaora::service::events::{EventBus, Event};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::FetchStarted {
//!     label: "home".to_string(),
//! });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<Event>;

/// Event bus for distributing events to any number of subscribers
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the specified per-subscriber capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Never blocks. Without subscribers the event is dropped.
    pub fn emit(&self, event: Event) {
        // send() only fails when nobody is listening
        let _ = self.sender.send(event);
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Events emitted by fetch controllers and services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A controller invoked its producer
    FetchStarted {
        /// Screen the controller belongs to
        label: String,
    },

    /// A fetch succeeded and its data was applied
    FetchSettled { label: String, count: usize },

    /// A fetch failed; `error` is the user-facing message
    FetchFailed { label: String, error: String },

    /// The signed-in user changed
    SessionChanged {
        logged_in: bool,
        account_id: Option<String>,
    },
}

impl Event {
    /// Alert text for events that should be shown to the user
    pub fn alert(&self) -> Option<&str> {
        match self {
            Event::FetchFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}
