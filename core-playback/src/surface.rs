//! # Control Surface
//!
//! Render model and driver for the visual controls of a player.
//!
//! A [`ControlSurface`] draws a [`ControlView`] and turns user input into
//! [`Intent`]s for [`PlaybackController::dispatch`]. It never owns playback
//! state: every render is computed from the controller's latest snapshot.
//!
//! [`SurfaceDriver`] wires the two together. It renders once, then re-renders
//! whenever the controller publishes `StateChanged` for its resource.
//!
//! ```rust,no_run
//! use core_playback::surface::{ControlSurface, ControlView, SurfaceDriver};
//! use core_playback::PlaybackController;
//! use std::sync::Arc;
//!
//! struct Stdout;
//!
//! impl ControlSurface for Stdout {
//!     fn render(&self, view: &ControlView) {
//!         println!("{} {} / {}", view.toggle.label, view.elapsed, view.total);
//!     }
//! }
//!
//! async fn run(controller: Arc<PlaybackController>) {
//!     SurfaceDriver::new(&controller, Arc::new(Stdout)).run().await;
//! }
//! ```

use crate::controller::PlaybackController;
use crate::format::format_time;
use crate::state::{PlaybackRate, PlaybackSnapshot};
use bridge_traits::platform::PlatformSendSync;
use core_runtime::config::PlayerConfig;
use core_runtime::events::{CoreEvent, EventStream, PlaybackEvent, RecvError};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

// ============================================================================
// Intents
// ============================================================================

/// User action forwarded from a control surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    TogglePlay,
    /// Seconds.
    Seek(f64),
    SetVolume(f32),
    SetPlaybackRate(PlaybackRate),
}

// ============================================================================
// View Model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleIcon {
    Play,
    Pause,
}

/// Play/pause button. Shows the action it performs, not the current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleButton {
    pub icon: ToggleIcon,
    /// Accessible label, `"Play"` or `"Pause"`.
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderView {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SliderView {
    fn clamp(&self, raw: f64) -> f64 {
        raw.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateOption {
    pub rate: PlaybackRate,
    pub label: &'static str,
    pub selected: bool,
}

/// Playback speed button and its drop-down menu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateMenu {
    pub label: &'static str,
    pub options: Vec<RateOption>,
}

/// Everything a surface needs to draw the controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlView {
    pub title: String,
    pub toggle: ToggleButton,
    /// Position slider; `max` falls back to the configured value while the
    /// duration is unknown.
    pub seek: SliderView,
    pub elapsed: String,
    pub total: String,
    pub rate: RateMenu,
    pub volume: SliderView,
}

impl ControlView {
    pub fn from_snapshot(snapshot: &PlaybackSnapshot, config: &PlayerConfig) -> Self {
        let toggle = if snapshot.is_playing {
            ToggleButton {
                icon: ToggleIcon::Pause,
                label: "Pause",
            }
        } else {
            ToggleButton {
                icon: ToggleIcon::Play,
                label: "Play",
            }
        };

        let seek_max = if snapshot.duration > 0.0 {
            snapshot.duration
        } else {
            config.seek_fallback_max
        };

        let options = PlaybackRate::ALL
            .into_iter()
            .map(|rate| RateOption {
                rate,
                label: rate.label(),
                selected: rate == snapshot.playback_rate,
            })
            .collect();

        Self {
            title: config.title.clone(),
            toggle,
            seek: SliderView {
                value: snapshot.current_time,
                min: 0.0,
                max: seek_max,
                step: config.seek_step,
            },
            elapsed: format_time(snapshot.current_time),
            total: format_time(snapshot.duration),
            rate: RateMenu {
                label: snapshot.playback_rate.label(),
                options,
            },
            volume: SliderView {
                value: f64::from(snapshot.volume),
                min: 0.0,
                max: 1.0,
                step: f64::from(config.volume_step),
            },
        }
    }

    /// Seek intent for a raw slider position, clamped to the slider range.
    pub fn seek_intent(&self, raw: f64) -> Intent {
        Intent::Seek(self.seek.clamp(raw))
    }

    /// Volume intent for a raw slider position, clamped to `0.0..=1.0`.
    pub fn volume_intent(&self, raw: f64) -> Intent {
        Intent::SetVolume(self.volume.clamp(raw) as f32)
    }
}

// ============================================================================
// Surface & Driver
// ============================================================================

/// A renderer for player controls (terminal UI, native widgets, DOM bridge).
pub trait ControlSurface: PlatformSendSync {
    fn render(&self, view: &ControlView);
}

/// Re-renders a [`ControlSurface`] after every state change of one
/// controller.
pub struct SurfaceDriver {
    controller: Weak<PlaybackController>,
    surface: Arc<dyn ControlSurface>,
    events: EventStream,
}

impl SurfaceDriver {
    /// Subscribes immediately, so no change published after `new` returns is
    /// missed.
    pub fn new(controller: &Arc<PlaybackController>, surface: Arc<dyn ControlSurface>) -> Self {
        let events = EventStream::new(controller.events().subscribe())
            .for_resource(controller.resource_id());

        Self {
            controller: Arc::downgrade(controller),
            surface,
            events,
        }
    }

    /// Render from the latest snapshot. Returns `false` once the controller
    /// is gone.
    pub fn render(&self) -> bool {
        let Some(controller) = self.controller.upgrade() else {
            return false;
        };
        let view = ControlView::from_snapshot(&controller.snapshot(), controller.config());
        self.surface.render(&view);
        true
    }

    /// Run until the controller is dropped or the bus closes.
    pub async fn run(mut self) {
        if !self.render() {
            return;
        }

        loop {
            match self.events.recv().await {
                Ok(CoreEvent::Playback(PlaybackEvent::StateChanged { .. })) => {
                    if !self.render() {
                        break;
                    }
                }
                Ok(CoreEvent::Playback(PlaybackEvent::Closed { .. })) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Surface lagged behind, re-rendering");
                    if !self.render() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Surface driver stopped");
    }
}

impl fmt::Debug for SurfaceDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceDriver")
            .field("controller_alive", &(self.controller.strong_count() > 0))
            .finish()
    }
}
