//! # Playback Controller
//!
//! Keeps a [`PlaybackSnapshot`] in sync with a platform [`MediaSource`] and
//! announces every transition on the [`EventBus`].
//!
//! ## Architecture
//!
//! ```text
//!               commands                       MediaEvent listeners
//!  Intent ──> PlaybackController ──────────> MediaSource ─────────────┐
//!                  │    ▲                                              │
//!                  │    └──────── Shared (state, epoch) <──────────────┘
//!                  ▼
//!               EventBus ──> SurfaceDriver ──> ControlSurface
//! ```
//!
//! The media source reports its lifecycle through listeners registered in
//! [`attach`](PlaybackController::attach). Each listener holds a weak
//! reference to the controller's shared state plus the epoch of the
//! attachment that created it, so events arriving after `detach` or after the
//! controller is dropped are ignored. A listener keeps the epoch read-locked
//! while it handles an event and teardown takes the write lock, so `detach`
//! returns only after in-flight events have been applied and published.
//!
//! The state lock is never held while a command runs on the media source.
//! Sources are free to dispatch events from inside `play()` or
//! `set_current_time()`.
//!
//! ## Usage
//!
//! ```rust
//! use bridge_desktop::HeadlessMediaSource;
//! use core_playback::PlaybackController;
//! use core_runtime::{EventBus, PlayerConfig};
//! use std::sync::Arc;
//!
//! let config = PlayerConfig::for_resource("/1.mp3");
//! let controller = PlaybackController::new(config, EventBus::default()).unwrap();
//!
//! let source = Arc::new(HeadlessMediaSource::new("/1.mp3", 125.0));
//! controller.attach(source.clone()).unwrap();
//! source.load();
//!
//! assert!(controller.toggle_play().unwrap());
//! assert_eq!(controller.snapshot().duration, 125.0);
//! ```

use crate::error::{PlaybackError, Result};
use crate::state::{PlaybackRate, PlaybackSnapshot, PlaybackState};
use crate::subscription::SubscriptionSet;
use crate::surface::Intent;
use bridge_traits::media::{MediaEvent, MediaListener, MediaSignal, MediaSource};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{ChangeReason, CoreEvent, EventBus, PlaybackEvent};
use core_runtime::logging::resource_label;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ============================================================================
// Shared State
// ============================================================================

/// State reachable from media source listeners.
struct Shared {
    resource_id: String,
    config: PlayerConfig,
    state: Mutex<PlaybackState>,
    /// Incremented on every attach and detach.
    epoch: RwLock<u64>,
    events: EventBus,
}

impl Shared {
    fn listener(self: &Arc<Self>, epoch: u64) -> MediaListener {
        let shared = Arc::downgrade(self);
        Arc::new(move |event: &MediaEvent| {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let current = shared.epoch.read();
            if *current == epoch {
                shared.handle_media_event(event);
            }
        })
    }

    /// Invalidate every listener handed out so far. Blocks until listeners
    /// already past the epoch check have finished.
    fn next_epoch(&self) -> u64 {
        let mut epoch = self.epoch.write();
        *epoch += 1;
        *epoch
    }

    fn handle_media_event(&self, event: &MediaEvent) {
        match event {
            MediaEvent::MetadataLoaded {
                duration,
                current_time,
            } => self.on_resource_ready(*duration, *current_time),
            MediaEvent::TimeUpdate { current_time } => self.on_progress(*current_time),
            MediaEvent::Playing => self.on_playing(),
            MediaEvent::Paused => self.on_paused(),
            MediaEvent::Ended => self.on_ended(),
            MediaEvent::PlayRejected { reason } => self.on_play_rejected(reason),
        }
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        self.state.lock().snapshot()
    }

    /// Apply a transition and publish `StateChanged` if it took effect.
    fn apply<F>(&self, reason: ChangeReason, transition: F) -> bool
    where
        F: FnOnce(&mut PlaybackState) -> bool,
    {
        let snapshot = {
            let mut state = self.state.lock();
            if !transition(&mut state) {
                return false;
            }
            state.snapshot()
        };

        debug!(
            ?reason,
            is_playing = snapshot.is_playing,
            current_time = snapshot.current_time,
            duration = snapshot.duration,
            "Playback state changed"
        );
        self.emit(PlaybackEvent::StateChanged {
            resource_id: self.resource_id.clone(),
            reason,
            is_playing: snapshot.is_playing,
            current_time: snapshot.current_time,
            duration: snapshot.duration,
        });
        true
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is not an error for the controller.
        self.events.emit(CoreEvent::Playback(event)).ok();
    }

    fn on_resource_ready(&self, duration: f64, current_time: f64) {
        if !duration.is_finite() || duration < 0.0 {
            warn!(duration, "Media source reported an unusable duration");
        }
        self.apply(ChangeReason::ResourceReady, |state| {
            state.resource_ready(duration, current_time)
        });
    }

    fn on_progress(&self, current_time: f64) {
        if !current_time.is_finite() || current_time < 0.0 {
            warn!(current_time, "Ignoring invalid progress report");
            return;
        }
        self.apply(ChangeReason::Progress, |state| state.progress(current_time));
    }

    fn on_ended(&self) {
        self.apply(ChangeReason::Ended, PlaybackState::ended);
    }

    fn on_playing(&self) {
        self.apply(ChangeReason::PlayConfirmed, PlaybackState::confirm_playing);
    }

    fn on_paused(&self) {
        self.apply(ChangeReason::PausedBySource, PlaybackState::pause);
    }

    fn on_play_rejected(&self, reason: &str) {
        warn!(reason, "Play command rejected by media source");
        self.apply(ChangeReason::PlayRejected, PlaybackState::reject_play);
        self.emit(PlaybackEvent::PlayRejected {
            resource_id: self.resource_id.clone(),
            message: reason.to_string(),
        });
    }

    /// Align `is_playing` with the source's run state.
    fn sync_run_state(&self, source_playing: bool) {
        if source_playing {
            self.on_playing();
        } else {
            self.on_paused();
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

struct Binding {
    source: Arc<dyn MediaSource>,
    subscriptions: SubscriptionSet,
}

/// Playback state machine for a single audio resource.
pub struct PlaybackController {
    shared: Arc<Shared>,
    binding: Mutex<Option<Binding>>,
}

impl PlaybackController {
    /// Create a controller for `config.resource_id`. No media source is
    /// attached yet; state starts at the defaults (paused, position 0,
    /// duration unknown, volume 1, rate 1x).
    pub fn new(config: PlayerConfig, events: EventBus) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                resource_id: config.resource_id.clone(),
                config,
                state: Mutex::new(PlaybackState::default()),
                epoch: RwLock::new(0),
                events,
            }),
            binding: Mutex::new(None),
        })
    }

    /// Like [`new`](Self::new) with a private bus sized by
    /// `config.event_buffer_size`. Subscribe through [`events`](Self::events).
    pub fn from_config(config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        let events = EventBus::new(config.event_buffer_size);
        Self::new(config, events)
    }

    pub fn resource_id(&self) -> &str {
        &self.shared.resource_id
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.shared.config
    }

    /// Bus this controller publishes on.
    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.snapshot()
    }

    pub fn is_attached(&self) -> bool {
        self.binding.lock().is_some()
    }

    fn source(&self) -> Option<Arc<dyn MediaSource>> {
        self.binding
            .lock()
            .as_ref()
            .map(|binding| Arc::clone(&binding.source))
    }

    fn require_source(&self) -> Result<Arc<dyn MediaSource>> {
        self.source().ok_or(PlaybackError::NoSourceAttached)
    }

    // ------------------------------------------------------------------------
    // Binding
    // ------------------------------------------------------------------------

    /// Subscribe to every media signal of `source`.
    ///
    /// A previously attached source is detached first. The stored volume and
    /// playback rate are pushed to the new source, and if it already knows its
    /// duration the resource is marked ready immediately.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::ResourceMismatch`] if the source is bound to another
    /// resource (the current binding is left untouched), or
    /// [`PlaybackError::Bridge`] if subscribing or pushing settings fails. In
    /// the latter case every listener registered so far is removed again.
    #[instrument(skip(self, source), fields(resource = resource_label(&self.shared.resource_id)))]
    pub fn attach(&self, source: Arc<dyn MediaSource>) -> Result<()> {
        let actual = source.resource_id();
        if actual != self.shared.resource_id {
            return Err(PlaybackError::ResourceMismatch {
                expected: self.shared.resource_id.clone(),
                actual,
            });
        }

        let mut binding = self.binding.lock();
        if let Some(previous) = binding.take() {
            self.release(previous);
        }

        let epoch = self.shared.next_epoch();
        let mut subscriptions = SubscriptionSet::new(Arc::clone(&source));
        subscriptions.subscribe_all(&MediaSignal::ALL, self.shared.listener(epoch))?;

        let settings = self.shared.snapshot();
        source.set_volume(settings.volume)?;
        source.set_playback_rate(settings.playback_rate.as_f64())?;

        debug!(listeners = subscriptions.len(), epoch, "Subscribed to media source");
        *binding = Some(Binding {
            source: Arc::clone(&source),
            subscriptions,
        });
        drop(binding);

        info!("Media source attached");
        self.shared.emit(PlaybackEvent::Attached {
            resource_id: self.shared.resource_id.clone(),
        });

        if let Some(duration) = source.duration() {
            self.shared
                .on_resource_ready(duration, source.current_time());
        }
        self.shared.sync_run_state(!source.is_paused());
        Ok(())
    }

    /// Remove every listener from the attached source. Returns `false` if no
    /// source was attached. The source is not paused and the state is kept.
    pub fn detach(&self) -> bool {
        let previous = self.binding.lock().take();
        match previous {
            Some(binding) => {
                self.release(binding);
                true
            }
            None => false,
        }
    }

    fn release(&self, mut binding: Binding) {
        self.shared.next_epoch();
        binding.subscriptions.release();
        info!(
            resource = resource_label(&self.shared.resource_id),
            "Media source detached"
        );
        self.shared.emit(PlaybackEvent::Detached {
            resource_id: self.shared.resource_id.clone(),
        });
    }

    // ------------------------------------------------------------------------
    // Media source notifications
    // ------------------------------------------------------------------------

    /// Metadata is available. A non-finite or negative duration keeps the
    /// duration unknown.
    pub fn on_resource_ready(&self, duration: f64, current_time: f64) {
        self.shared.on_resource_ready(duration, current_time);
    }

    /// Position advanced. Never changes `is_playing`; ignored right after the
    /// end of the resource until playback restarts or a seek happens.
    pub fn on_progress(&self, current_time: f64) {
        self.shared.on_progress(current_time);
    }

    /// End of resource: paused at position 0. No command is sent to the
    /// source.
    pub fn on_ended(&self) {
        self.shared.on_ended();
    }

    pub fn on_playing(&self) {
        self.shared.on_playing();
    }

    pub fn on_paused(&self) {
        self.shared.on_paused();
    }

    /// The source declined to play; `is_playing` rolls back to `false`.
    pub fn on_play_rejected(&self, reason: &str) {
        self.shared.on_play_rejected(reason);
    }

    // ------------------------------------------------------------------------
    // User intents
    // ------------------------------------------------------------------------

    /// Play if the source is paused, pause otherwise. Returns the resulting
    /// `is_playing`.
    ///
    /// Under [`CommitPolicy::Acknowledged`](core_runtime::config::CommitPolicy::Acknowledged)
    /// a play intent returns `false`
    /// until the source confirms playback. A rejected play is reported on the
    /// event bus, not as an error. Any other failure of `play()` also rolls
    /// `is_playing` back and is returned.
    pub fn toggle_play(&self) -> Result<bool> {
        let source = self.require_source()?;

        if source.is_paused() {
            let policy = self.shared.config.commit_policy;
            self.shared
                .apply(ChangeReason::PlayToggled, |state| state.begin_play(policy));

            if let Err(e) = source.play() {
                self.shared.on_play_rejected(&e.to_string());
                if !e.is_play_rejection() {
                    return Err(e.into());
                }
            }
        } else {
            self.shared
                .apply(ChangeReason::PlayToggled, PlaybackState::pause);

            if let Err(e) = source.pause() {
                warn!(error = %e, "Pause command failed");
                self.shared.sync_run_state(!source.is_paused());
                return Err(e.into());
            }
        }

        Ok(self.shared.snapshot().is_playing)
    }

    /// Jump to `time` seconds. The new position is visible immediately; the
    /// source reports the effective position through its next progress event.
    pub fn seek(&self, time: f64) -> Result<()> {
        if !time.is_finite() || time < 0.0 {
            return Err(PlaybackError::InvalidSeekPosition(time));
        }
        let source = self.require_source()?;

        self.shared.apply(ChangeReason::Seeked, |state| state.seek(time));
        source.set_current_time(time)?;
        Ok(())
    }

    /// Set output gain in `0.0..=1.0`. Stored even without a source and
    /// pushed on the next attach.
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }
        if let Some(source) = self.source() {
            source.set_volume(volume)?;
        }

        self.shared
            .apply(ChangeReason::VolumeChanged, |state| state.set_volume(volume));
        Ok(())
    }

    /// Set playback speed. Stored even without a source and pushed on the
    /// next attach.
    pub fn set_playback_rate(&self, rate: PlaybackRate) -> Result<()> {
        if let Some(source) = self.source() {
            source.set_playback_rate(rate.as_f64())?;
        }

        self.shared
            .apply(ChangeReason::RateChanged, |state| state.set_playback_rate(rate));
        Ok(())
    }

    /// Like [`set_playback_rate`](Self::set_playback_rate) for a raw
    /// multiplier, which must be one of 0.5, 1, 1.5 or 2.
    pub fn set_playback_rate_value(&self, rate: f64) -> Result<()> {
        self.set_playback_rate(PlaybackRate::try_from(rate)?)
    }

    /// Route a control surface intent to the matching operation.
    pub fn dispatch(&self, intent: Intent) -> Result<()> {
        debug!(?intent, "Dispatching intent");
        match intent {
            Intent::TogglePlay => self.toggle_play().map(|_| ()),
            Intent::Seek(time) => self.seek(time),
            Intent::SetVolume(volume) => self.set_volume(volume),
            Intent::SetPlaybackRate(rate) => self.set_playback_rate(rate),
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.detach();
        self.shared.emit(PlaybackEvent::Closed {
            resource_id: self.shared.resource_id.clone(),
        });
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("resource_id", &self.shared.resource_id)
            .field("attached", &self.is_attached())
            .field("state", &self.snapshot())
            .finish()
    }
}
