//! Event system for progress tracking
//!
//! In-process event bus over `tokio::sync::broadcast`. Services emit events
//! around every suspension point (upload, submit) so a front end can show a
//! busy state for exactly the span of the call.
//!
//! If no subscribers exist, events are dropped immediately. Subscribers can
//! lag without blocking emitters.
//!
//! # Example
//!
//! ```no_run
//! use libfanout::service::events::{EventBus, Event};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::SubmitStarted {
//!     platforms: vec!["twitter".to_string()],
//!     scheduled: false,
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

/// Event bus for distributing progress events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the specified capacity
    ///
    /// The capacity determines how many events can be buffered per subscriber
    /// before older events are dropped (if the subscriber is lagging).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers without blocking
    pub fn emit(&self, event: Event) {
        // send() only fails when nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Events emitted by services during operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A batch upload was sent
    UploadStarted { batch: u64, files: usize },

    /// Previews of the batch were replaced by remote media
    UploadCompleted { batch: u64, items: usize },

    /// The batch was rolled back
    UploadFailed { batch: u64, error: String },

    /// Validation passed and the first network call is about to go out
    SubmitStarted {
        platforms: Vec<String>,
        scheduled: bool,
    },

    /// The create call returned an id
    PostCreated { post_id: String },

    PostPublished { post_id: String },

    PostScheduled {
        post_id: String,
        scheduled_at: String,
    },

    /// Submit ended in a failure; `post_id` is set when a record was left behind
    SubmitFailed {
        phase: String,
        post_id: Option<String>,
        error: String,
    },

    /// The draft was stored remotely with status `draft`
    DraftSaved { post_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_emission_and_subscription() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.emit(Event::PostCreated {
            post_id: "test123".to_string(),
        });

        match receiver.recv().await.unwrap() {
            Event::PostCreated { post_id } => assert_eq!(post_id, "test123"),
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        let event = Event::UploadStarted { batch: 1, files: 3 };
        event_bus.emit(event.clone());

        assert_eq!(receiver1.recv().await.unwrap(), event);
        assert_eq!(receiver2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let event_bus = EventBus::new(10);

        // Emit event with no subscribers - should not panic or block
        event_bus.emit(Event::DraftSaved {
            post_id: "p".to_string(),
        });

        assert_eq!(event_bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::SubmitFailed {
            phase: "publish".to_string(),
            post_id: Some("p-9".to_string()),
            error: "Network timeout".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("submit_failed"));
        assert!(json.contains("p-9"));

        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[tokio::test]
    async fn test_subscriber_count() {
        let event_bus = EventBus::new(10);
        assert_eq!(event_bus.subscriber_count(), 0);

        let _receiver1 = event_bus.subscribe();
        let _receiver2 = event_bus.subscribe();
        assert_eq!(event_bus.subscriber_count(), 2);
    }
}
