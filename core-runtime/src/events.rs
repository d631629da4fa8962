//! # Event Bus System
//!
//! Broadcasts player notifications using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! A `PlaybackController` publishes a [`PlaybackEvent::StateChanged`] after
//! every transition. Control surfaces subscribe, and on each notification read
//! the controller's latest snapshot and re-render. The payload carries the
//! headline fields so lightweight observers (loggers, media-session bridges)
//! do not need a handle to the controller.
//!
//! ```text
//! ┌────────────────────┐  emit   ┌──────────┐  subscribe  ┌────────────────┐
//! │ PlaybackController ├────────>│ EventBus ├────────────>│ SurfaceDriver  │
//! └────────────────────┘         │(broadcast├────────────>│ other observers│
//!                                └──────────┘             └────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{ChangeReason, CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::StateChanged {
//!     resource_id: "/1.mp3".to_string(),
//!     reason: ChangeReason::Seeked,
//!     is_playing: false,
//!     current_time: 42.0,
//!     duration: 125.0,
//! }))
//! .ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event.resource_id(), "/1.mp3");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Snapshot
//!   readers can simply re-render from the current state.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Progress notifications arrive at roughly 4 Hz, so 100 events cover well
/// over ten seconds of a stalled subscriber.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Playback controller notifications
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::PlayRejected { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::Attached { .. })
            | CoreEvent::Playback(PlaybackEvent::Detached { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Resource the event refers to.
    pub fn resource_id(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.resource_id(),
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Transition that caused a [`PlaybackEvent::StateChanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    ResourceReady,
    Progress,
    Ended,
    PlayToggled,
    PlayConfirmed,
    PausedBySource,
    PlayRejected,
    Seeked,
    VolumeChanged,
    RateChanged,
}

/// Notifications emitted by a playback controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Controller subscribed to a media source.
    Attached { resource_id: String },
    /// Controller released its media source subscriptions.
    Detached { resource_id: String },
    /// Playback state changed; re-read the snapshot to render.
    StateChanged {
        resource_id: String,
        reason: ChangeReason,
        is_playing: bool,
        /// Position in seconds.
        current_time: f64,
        /// Duration in seconds, 0 while unknown.
        duration: f64,
    },
    /// The media source declined a play command.
    PlayRejected {
        resource_id: String,
        message: String,
    },
    /// Controller was torn down; no further events for this resource.
    Closed { resource_id: String },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Attached { .. } => "Media source attached",
            PlaybackEvent::Detached { .. } => "Media source detached",
            PlaybackEvent::StateChanged { .. } => "Playback state changed",
            PlaybackEvent::PlayRejected { .. } => "Play command rejected",
            PlaybackEvent::Closed { .. } => "Player closed",
        }
    }

    pub fn resource_id(&self) -> &str {
        match self {
            PlaybackEvent::Attached { resource_id }
            | PlaybackEvent::Detached { resource_id }
            | PlaybackEvent::StateChanged { resource_id, .. }
            | PlaybackEvent::PlayRejected { resource_id, .. }
            | PlaybackEvent::Closed { resource_id } => resource_id,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Clones share the same channel. Each `subscribe()` creates an independent
/// receiver that sees every event emitted after it was created.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering at most `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when nobody is listening.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let stream = EventStream::new(bus.subscribe()).for_resource("/1.mp3");
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only deliver events matching `predicate`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only deliver events about `resource_id`.
    pub fn for_resource(self, resource_id: impl Into<String>) -> Self {
        let resource_id = resource_id.into();
        self.filter(move |event| event.resource_id() == resource_id)
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once all senders are gone.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state_changed(resource: &str, current_time: f64) -> CoreEvent {
        CoreEvent::Playback(PlaybackEvent::StateChanged {
            resource_id: resource.to_string(),
            reason: ChangeReason::Progress,
            is_playing: true,
            current_time,
            duration: 125.0,
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(state_changed("/1.mp3", 1.0)).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = state_changed("/1.mp3", 60.0);
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_stream_filters_by_resource() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe()).for_resource("/2.mp3");

        bus.emit(state_changed("/1.mp3", 5.0)).ok();
        let wanted = state_changed("/2.mp3", 7.0);
        bus.emit(wanted.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), wanted);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(state_changed("/1.mp3", i as f64)).ok();
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[tokio::test]
    async fn test_try_recv_empty_and_filtered() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Playback(PlaybackEvent::Closed { .. })));

        assert!(stream.try_recv().is_none());

        bus.emit(state_changed("/1.mp3", 1.0)).ok();
        assert!(stream.try_recv().is_none());

        let closed = CoreEvent::Playback(PlaybackEvent::Closed {
            resource_id: "/1.mp3".to_string(),
        });
        bus.emit(closed.clone()).ok();
        assert_eq!(stream.try_recv().unwrap().unwrap(), closed);
    }

    #[test]
    fn test_event_severity_and_description() {
        let rejected = CoreEvent::Playback(PlaybackEvent::PlayRejected {
            resource_id: "/1.mp3".to_string(),
            message: "NotAllowedError".to_string(),
        });
        assert_eq!(rejected.severity(), EventSeverity::Warning);
        assert_eq!(rejected.description(), "Play command rejected");

        let attached = CoreEvent::Playback(PlaybackEvent::Attached {
            resource_id: "/1.mp3".to_string(),
        });
        assert_eq!(attached.severity(), EventSeverity::Info);

        assert_eq!(state_changed("/1.mp3", 3.0).severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_serialization() {
        let event = state_changed("/1.mp3", 60.0);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"reason\":\"progress\""));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }
}
