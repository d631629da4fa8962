//! Headless media transport for desktop hosts and tests.
//!
//! `HeadlessMediaSource` keeps a simulated position that advances with wall
//! time while playing. It emits the same signal sequence a browser audio
//! element does: `MetadataLoaded` once loaded, `TimeUpdate` at every clock
//! tick, and `TimeUpdate`, `Paused`, `Ended` when the resource runs out.

use bridge_traits::{
    error::{BridgeError, Result},
    media::{ListenerId, ListenerRegistry, MediaEvent, MediaListener, MediaSignal, MediaSource},
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

/// Native `timeupdate` cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Reason reported when autoplay is blocked.
pub const AUTOPLAY_BLOCKED_REASON: &str = "NotAllowedError: play() requires a user gesture";

#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Total length in seconds, reported once [`HeadlessMediaSource::load`]
    /// is called.
    pub duration: f64,
    /// Decline every play command, as a browser does without user activation.
    pub autoplay_blocked: bool,
    pub tick_interval: Duration,
}

impl HeadlessConfig {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            autoplay_blocked: false,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_autoplay_blocked(mut self, blocked: bool) -> Self {
        self.autoplay_blocked = blocked;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

#[derive(Debug)]
struct Transport {
    loaded: bool,
    paused: bool,
    ended: bool,
    current_time: f64,
    volume: f32,
    rate: f64,
    autoplay_blocked: bool,
}

/// Simulated audio element bound to one resource.
#[derive(Debug)]
pub struct HeadlessMediaSource {
    resource_id: String,
    duration: f64,
    tick_interval: Duration,
    transport: Mutex<Transport>,
    listeners: ListenerRegistry,
}

impl HeadlessMediaSource {
    pub fn new(resource_id: impl Into<String>, duration: f64) -> Self {
        Self::with_config(resource_id, HeadlessConfig::new(duration))
    }

    pub fn with_config(resource_id: impl Into<String>, config: HeadlessConfig) -> Self {
        Self {
            resource_id: resource_id.into(),
            duration: config.duration,
            tick_interval: config.tick_interval,
            transport: Mutex::new(Transport {
                loaded: false,
                paused: true,
                ended: false,
                current_time: 0.0,
                volume: 1.0,
                rate: 1.0,
                autoplay_blocked: config.autoplay_blocked,
            }),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Finish loading metadata and announce the duration.
    pub fn load(&self) {
        let current_time = {
            let mut transport = self.transport.lock();
            transport.loaded = true;
            transport.current_time
        };
        debug!(resource = %self.resource_id, duration = self.duration, "Metadata loaded");
        self.emit(MediaEvent::MetadataLoaded {
            duration: self.duration,
            current_time,
        });
    }

    /// Move the clock forward by `elapsed` of wall time.
    pub fn advance(&self, elapsed: Duration) {
        let (current_time, reached_end) = {
            let mut transport = self.transport.lock();
            if transport.paused {
                return;
            }

            let mut position = transport.current_time + elapsed.as_secs_f64() * transport.rate;
            let reached_end = transport.loaded && position >= self.duration;
            if reached_end {
                position = self.duration;
                transport.paused = true;
                transport.ended = true;
            }
            transport.current_time = position;
            (position, reached_end)
        };

        trace!(current_time, "Clock tick");
        self.emit(MediaEvent::TimeUpdate { current_time });
        if reached_end {
            debug!(resource = %self.resource_id, "Reached end of resource");
            self.emit(MediaEvent::Paused);
            self.emit(MediaEvent::Ended);
        }
    }

    /// Drive [`advance`](Self::advance) from a tokio interval at the
    /// configured tick rate. The task ends once the source is dropped.
    pub fn spawn_clock(self: &Arc<Self>) -> JoinHandle<()> {
        let period = self.tick_interval;
        let source: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(source) = source.upgrade() else {
                    break;
                };
                source.advance(period);
            }
        })
    }

    /// Simulate user activation lifting (or imposing) the autoplay block.
    pub fn set_autoplay_blocked(&self, blocked: bool) {
        self.transport.lock().autoplay_blocked = blocked;
    }

    pub fn volume(&self) -> f32 {
        self.transport.lock().volume
    }

    pub fn playback_rate(&self) -> f64 {
        self.transport.lock().rate
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn emit(&self, event: MediaEvent) {
        self.listeners.dispatch(&event);
    }
}

impl MediaSource for HeadlessMediaSource {
    fn resource_id(&self) -> String {
        self.resource_id.clone()
    }

    fn play(&self) -> Result<()> {
        let restarted = {
            let mut transport = self.transport.lock();
            if transport.autoplay_blocked {
                None
            } else {
                let restarted = transport.ended;
                if restarted {
                    transport.current_time = 0.0;
                    transport.ended = false;
                }
                transport.paused = false;
                Some(restarted)
            }
        };

        match restarted {
            None => {
                warn!(resource = %self.resource_id, "Autoplay blocked");
                self.emit(MediaEvent::PlayRejected {
                    reason: AUTOPLAY_BLOCKED_REASON.to_string(),
                });
            }
            Some(restarted) => {
                if restarted {
                    self.emit(MediaEvent::TimeUpdate { current_time: 0.0 });
                }
                self.emit(MediaEvent::Playing);
            }
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let was_playing = {
            let mut transport = self.transport.lock();
            let was_playing = !transport.paused;
            transport.paused = true;
            was_playing
        };

        if was_playing {
            self.emit(MediaEvent::Paused);
        }
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.transport.lock().paused
    }

    fn current_time(&self) -> f64 {
        self.transport.lock().current_time
    }

    fn set_current_time(&self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() {
            return Err(BridgeError::OperationFailed(format!(
                "cannot seek to {}",
                seconds
            )));
        }

        let current_time = {
            let mut transport = self.transport.lock();
            let upper = if transport.loaded {
                self.duration
            } else {
                f64::MAX
            };
            transport.current_time = seconds.clamp(0.0, upper);
            transport.ended = false;
            transport.current_time
        };

        self.emit(MediaEvent::TimeUpdate { current_time });
        Ok(())
    }

    fn duration(&self) -> Option<f64> {
        if self.transport.lock().loaded {
            Some(self.duration)
        } else {
            None
        }
    }

    fn set_volume(&self, volume: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(BridgeError::OperationFailed(format!(
                "volume {} out of range",
                volume
            )));
        }
        self.transport.lock().volume = volume;
        Ok(())
    }

    fn set_playback_rate(&self, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(BridgeError::OperationFailed(format!(
                "playback rate {} not supported",
                rate
            )));
        }
        self.transport.lock().rate = rate;
        Ok(())
    }

    fn subscribe(&self, signal: MediaSignal, listener: MediaListener) -> Result<ListenerId> {
        Ok(self.listeners.add(signal, listener))
    }

    fn unsubscribe(&self, id: ListenerId) -> Result<()> {
        self.listeners.remove(id)
    }
}
