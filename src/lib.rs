//! Workspace façade crate.
//!
//! Exposes feature flags that map to the individual workspace crates
//! (`core-playback`, `bridge-desktop`). Host applications can depend on
//! `player-workspace` and enable the documented features without wiring each
//! crate individually.

pub use bridge_traits;
pub use core_runtime;

#[cfg(feature = "playback")]
pub use core_playback;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;
