//! # Desktop Bridge Implementations
//!
//! Implementations of bridge traits for desktop platforms (macOS, Windows,
//! Linux) and headless environments.
//!
//! ## Overview
//!
//! - `HeadlessMediaSource`: a simulated `MediaSource` whose clock is driven by
//!   a Tokio interval task. Hosts without a native media element use it, as
//!   do demos and integration tests.
//!
//! ## Usage
//!
//! ```no_run
//! use bridge_desktop::HeadlessMediaSource;
//! use bridge_traits::MediaSource;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = Arc::new(HeadlessMediaSource::new("/1.mp3", 125.0));
//!     source.load();
//!     let clock = source.spawn_clock();
//!
//!     source.play().unwrap();
//!     // ...
//!     clock.abort();
//! }
//! ```

mod media;

pub use media::{
    HeadlessConfig, HeadlessMediaSource, AUTOPLAY_BLOCKED_REASON, DEFAULT_TICK_INTERVAL,
};
