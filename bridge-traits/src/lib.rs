//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host must implement for the player
//! core.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the
//! platform. The core never decodes audio itself: it drives a
//! [`MediaSource`](media::MediaSource) (an `<audio>` element, a native player,
//! or the headless transport shipped in `bridge-desktop`) and reacts to the
//! lifecycle signals it emits.
//!
//! ## Traits
//!
//! - [`MediaSource`](media::MediaSource) - Play/pause, seek, volume, rate and
//!   lifecycle signals for one audio resource
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop / headless | `bridge-desktop` | ✅ Available |
//! | Web      | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform-specific failures into it with an actionable
//! message.
//!
//! ## Thread Safety
//!
//! Native targets require `Send + Sync` on every bridge (see
//! [`platform`]); `wasm32` builds drop those bounds.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::media::{MediaEvent, MediaSignal, MediaSource};
//! use std::sync::Arc;
//!
//! fn log_end(source: &dyn MediaSource) -> bridge_traits::error::Result<()> {
//!     source.subscribe(
//!         MediaSignal::Ended,
//!         Arc::new(|_event: &MediaEvent| tracing::info!("finished")),
//!     )?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod media;
pub mod platform;

pub use error::BridgeError;

// Re-export commonly used types
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{
    ListenerId, ListenerRegistry, MediaEvent, MediaListener, MediaSignal, MediaSource,
};
pub use platform::PlatformSendSync;
