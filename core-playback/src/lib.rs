//! # Playback Control Module
//!
//! Play/pause, seek, volume and playback-rate control for a single audio
//! resource.
//!
//! ## Overview
//!
//! This module handles:
//! - The [`PlaybackController`] state machine, kept in sync with a platform
//!   `MediaSource` through scoped listener subscriptions
//! - Immutable [`PlaybackSnapshot`]s and the discrete [`PlaybackRate`] set
//! - `M:SS` time labels
//! - The [`ControlView`] render model and the [`SurfaceDriver`] that keeps a
//!   [`ControlSurface`] up to date
//!
//! Decoding and audio output are owned by the `MediaSource`; this crate only
//! issues commands and tracks state.

pub mod controller;
pub mod error;
pub mod format;
pub mod state;
pub mod subscription;
pub mod surface;

pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use format::format_time;
pub use state::{Phase, PlaybackRate, PlaybackSnapshot};
pub use subscription::SubscriptionSet;
pub use surface::{ControlSurface, ControlView, Intent, SurfaceDriver};
