//! # Playback State
//!
//! The state owned by a [`PlaybackController`](crate::PlaybackController) and
//! the pure transitions applied to it. Side effects (media source commands,
//! event emission, logging) live in the controller; everything here is
//! deterministic and synchronous.

use crate::error::PlaybackError;
use core_runtime::config::CommitPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete playback speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub enum PlaybackRate {
    Half,
    #[default]
    Normal,
    OneAndHalf,
    Double,
}

impl PlaybackRate {
    /// Menu order of the selectable rates.
    pub const ALL: [PlaybackRate; 4] = [
        PlaybackRate::Half,
        PlaybackRate::Normal,
        PlaybackRate::OneAndHalf,
        PlaybackRate::Double,
    ];

    pub fn as_f64(self) -> f64 {
        match self {
            PlaybackRate::Half => 0.5,
            PlaybackRate::Normal => 1.0,
            PlaybackRate::OneAndHalf => 1.5,
            PlaybackRate::Double => 2.0,
        }
    }

    /// Button/menu label, e.g. `"1.5x"`.
    pub fn label(self) -> &'static str {
        match self {
            PlaybackRate::Half => "0.5x",
            PlaybackRate::Normal => "1x",
            PlaybackRate::OneAndHalf => "1.5x",
            PlaybackRate::Double => "2x",
        }
    }
}

impl From<PlaybackRate> for f64 {
    fn from(rate: PlaybackRate) -> Self {
        rate.as_f64()
    }
}

impl TryFrom<f64> for PlaybackRate {
    type Error = PlaybackError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        PlaybackRate::ALL
            .into_iter()
            .find(|rate| rate.as_f64() == value)
            .ok_or(PlaybackError::InvalidPlaybackRate(value))
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the resource's duration is known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Duration unknown (`duration == 0`).
    #[default]
    Idle,
    /// Duration reported by the media source.
    Ready,
}

/// Immutable copy of the playback state handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    /// Seconds.
    pub current_time: f64,
    /// Seconds; 0 while unknown.
    pub duration: f64,
    pub volume: f32,
    pub playback_rate: PlaybackRate,
    pub phase: Phase,
    /// A play command awaits acknowledgment (acknowledged commit policy only).
    pub play_pending: bool,
}

impl PlaybackSnapshot {
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        PlaybackState::default().snapshot()
    }
}

/// Mutable playback state. Every method returns `true` when the transition
/// was applied so the caller knows whether to notify observers.
#[derive(Debug, Clone)]
pub(crate) struct PlaybackState {
    is_playing: bool,
    current_time: f64,
    duration: f64,
    volume: f32,
    playback_rate: PlaybackRate,
    phase: Phase,
    /// Set by `ended`; progress reports are ignored until playback restarts,
    /// a seek happens, or new metadata arrives.
    freshly_ended: bool,
    play_pending: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            playback_rate: PlaybackRate::Normal,
            phase: Phase::Idle,
            freshly_ended: false,
            play_pending: false,
        }
    }
}

impl PlaybackState {
    pub(crate) fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            is_playing: self.is_playing,
            current_time: self.current_time,
            duration: self.duration,
            volume: self.volume,
            playback_rate: self.playback_rate,
            phase: self.phase,
            play_pending: self.play_pending,
        }
    }

    /// Metadata arrived. A duration that is not a positive finite number
    /// (live streams report infinity) keeps the resource `Idle`.
    pub(crate) fn resource_ready(&mut self, duration: f64, current_time: f64) -> bool {
        let position = if current_time.is_finite() && current_time >= 0.0 {
            current_time
        } else {
            0.0
        };

        self.freshly_ended = false;
        if duration.is_finite() && duration > 0.0 {
            self.duration = duration;
            self.phase = Phase::Ready;
            self.current_time = position.min(duration);
        } else {
            self.duration = 0.0;
            self.phase = Phase::Idle;
            self.current_time = position;
        }
        true
    }

    pub(crate) fn progress(&mut self, current_time: f64) -> bool {
        if self.freshly_ended || !current_time.is_finite() || current_time < 0.0 {
            return false;
        }

        self.current_time = if self.phase == Phase::Ready {
            current_time.min(self.duration)
        } else {
            current_time
        };
        true
    }

    pub(crate) fn ended(&mut self) -> bool {
        self.is_playing = false;
        self.play_pending = false;
        self.current_time = 0.0;
        self.freshly_ended = true;
        true
    }

    /// A play command is about to be issued.
    pub(crate) fn begin_play(&mut self, policy: CommitPolicy) -> bool {
        self.freshly_ended = false;
        match policy {
            CommitPolicy::Optimistic => {
                self.is_playing = true;
                self.play_pending = false;
            }
            CommitPolicy::Acknowledged => {
                self.play_pending = true;
            }
        }
        true
    }

    /// The media source reports that playback is running.
    pub(crate) fn confirm_playing(&mut self) -> bool {
        if self.is_playing && !self.play_pending {
            return false;
        }
        self.is_playing = true;
        self.play_pending = false;
        self.freshly_ended = false;
        true
    }

    /// Playback stopped, by request or by the source.
    pub(crate) fn pause(&mut self) -> bool {
        if !self.is_playing && !self.play_pending {
            return false;
        }
        self.is_playing = false;
        self.play_pending = false;
        true
    }

    /// A play command was declined; roll the optimistic flag back.
    pub(crate) fn reject_play(&mut self) -> bool {
        self.pause()
    }

    pub(crate) fn seek(&mut self, time: f64) -> bool {
        self.current_time = time;
        self.freshly_ended = false;
        true
    }

    pub(crate) fn set_volume(&mut self, volume: f32) -> bool {
        self.volume = volume;
        true
    }

    pub(crate) fn set_playback_rate(&mut self, rate: PlaybackRate) -> bool {
        self.playback_rate = rate;
        true
    }
}
