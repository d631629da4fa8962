//! Media source bridge trait and supporting event types.
//!
//! A [`MediaSource`] is the platform's audio playback primitive: an HTML
//! `<audio>` element on the web, an `AVPlayer` on iOS, or the headless
//! transport from `bridge-desktop`. It owns decoding, timing and gain; the
//! core only issues commands and listens to its lifecycle signals.
//!
//! ## Command contract
//!
//! Commands are synchronous *issue* calls. A platform may start playback
//! asynchronously (autoplay permission, buffering), but `play()` and `pause()`
//! must flip the value reported by [`MediaSource::is_paused`] before they
//! return so that consecutive toggles alternate. Asynchronous completion is
//! reported through [`MediaEvent::Playing`]; asynchronous failure through
//! [`MediaEvent::PlayRejected`].
//!
//! ## Listener contract
//!
//! Listeners are registered per [`MediaSignal`] and identified by the returned
//! [`ListenerId`]. After [`MediaSource::unsubscribe`] returns, the listener
//! must never be invoked again. Sources may invoke listeners re-entrantly from
//! inside a command, so listeners must not assume they run outside one.

use crate::error::{BridgeError, Result};
use crate::platform::{DynListenerFn, PlatformSendSync};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle signals a media source can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaSignal {
    /// Enough metadata is loaded to report a real duration (`loadeddata`).
    MetadataLoaded,
    /// Current time advanced or was changed by a seek (`timeupdate`).
    TimeUpdate,
    /// Playback actually started.
    Playing,
    /// Playback stopped advancing (user pause, end of resource, media keys).
    Paused,
    /// End of resource reached.
    Ended,
    /// A play command was declined by the platform.
    PlayRejected,
}

impl MediaSignal {
    /// Every signal, in the order the controller subscribes to them.
    pub const ALL: [MediaSignal; 6] = [
        MediaSignal::MetadataLoaded,
        MediaSignal::TimeUpdate,
        MediaSignal::Playing,
        MediaSignal::Paused,
        MediaSignal::Ended,
        MediaSignal::PlayRejected,
    ];
}

/// Event payload delivered to listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum MediaEvent {
    MetadataLoaded {
        /// Total length in seconds.
        duration: f64,
        /// Position in seconds at the time metadata became available.
        current_time: f64,
    },
    TimeUpdate {
        current_time: f64,
    },
    Playing,
    Paused,
    Ended,
    PlayRejected {
        /// Platform-provided reason (e.g. `NotAllowedError`).
        reason: String,
    },
}

impl MediaEvent {
    /// The signal this event is delivered on.
    pub fn signal(&self) -> MediaSignal {
        match self {
            MediaEvent::MetadataLoaded { .. } => MediaSignal::MetadataLoaded,
            MediaEvent::TimeUpdate { .. } => MediaSignal::TimeUpdate,
            MediaEvent::Playing => MediaSignal::Playing,
            MediaEvent::Paused => MediaSignal::Paused,
            MediaEvent::Ended => MediaSignal::Ended,
            MediaEvent::PlayRejected { .. } => MediaSignal::PlayRejected,
        }
    }
}

/// Identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Shared callback invoked with each event on the subscribed signal.
pub type MediaListener = Arc<DynListenerFn<MediaEvent>>;

/// Platform audio playback primitive.
pub trait MediaSource: PlatformSendSync {
    /// Identifier of the single resource this source is bound to.
    fn resource_id(&self) -> String;

    /// Request playback. See the module docs for the paused-flag contract.
    fn play(&self) -> Result<()>;

    /// Pause playback, keeping the current position.
    fn pause(&self) -> Result<()>;

    /// Whether the source is currently paused (true before the first play).
    fn is_paused(&self) -> bool;

    /// Current position in seconds.
    fn current_time(&self) -> f64;

    /// Move the playback position.
    fn set_current_time(&self, seconds: f64) -> Result<()>;

    /// Total duration in seconds, `None` until metadata is loaded.
    fn duration(&self) -> Option<f64>;

    /// Set the output gain in `0.0..=1.0`.
    fn set_volume(&self, volume: f32) -> Result<()>;

    /// Set the speed multiplier.
    fn set_playback_rate(&self, rate: f64) -> Result<()>;

    /// Register a listener for one signal.
    fn subscribe(&self, signal: MediaSignal, listener: MediaListener) -> Result<ListenerId>;

    /// Remove a listener. Unknown ids yield [`BridgeError::UnknownListener`].
    fn unsubscribe(&self, id: ListenerId) -> Result<()>;
}

struct Registration {
    id: ListenerId,
    signal: MediaSignal,
    listener: MediaListener,
    /// Cleared by `remove`; checked again right before each call.
    active: Arc<AtomicBool>,
}

/// Listener bookkeeping for [`MediaSource`] implementations.
///
/// `dispatch` snapshots the matching listeners before invoking them, so a
/// listener may subscribe, unsubscribe or issue commands on the source
/// without deadlocking. A listener removed while a dispatch is under way is
/// skipped by the rest of that dispatch.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: Mutex<Vec<Registration>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, signal: MediaSignal, listener: MediaListener) -> ListenerId {
        let id = ListenerId::new();
        self.entries.lock().push(Registration {
            id,
            signal,
            listener,
            active: Arc::new(AtomicBool::new(true)),
        });
        id
    }

    pub fn remove(&self, id: ListenerId) -> Result<()> {
        let mut entries = self.entries.lock();
        let Some(index) = entries.iter().position(|entry| entry.id == id) else {
            return Err(BridgeError::UnknownListener(id.to_string()));
        };
        let removed = entries.remove(index);
        removed.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Invoke every listener registered for the event's signal. Returns the
    /// number of listeners called.
    pub fn dispatch(&self, event: &MediaEvent) -> usize {
        let signal = event.signal();
        let listeners: Vec<(MediaListener, Arc<AtomicBool>)> = self
            .entries
            .lock()
            .iter()
            .filter(|entry| entry.signal == signal)
            .map(|entry| (Arc::clone(&entry.listener), Arc::clone(&entry.active)))
            .collect();

        let mut called = 0;
        for (listener, active) in &listeners {
            if active.load(Ordering::SeqCst) {
                listener(event);
                called += 1;
            }
        }
        called
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn count_for(&self, signal: MediaSignal) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.signal == signal)
            .count()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
