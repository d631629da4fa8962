//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the player core:
//! - Logging and tracing infrastructure
//! - Player configuration
//! - Event bus used to signal state changes to control surfaces
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the playback crate depends on.
//! It establishes the logging conventions and the broadcast mechanism through
//! which a `PlaybackController` tells its renderers that a new snapshot is
//! available.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CommitPolicy, PlayerConfig, PlayerConfigBuilder};
pub use error::{Error, Result};
pub use events::{ChangeReason, CoreEvent, EventBus, EventStream, PlaybackEvent};
