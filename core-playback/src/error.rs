//! # Playback Error Types
//!
//! Errors returned by the playback controller.
//!
//! A play command declined by the platform is deliberately *not* an error
//! here: the controller reconciles it into `is_playing = false` and publishes
//! a `PlayRejected` event instead.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback control operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Binding Errors
    // ========================================================================
    /// A command needs a media source but none is attached.
    #[error("No media source attached")]
    NoSourceAttached,

    /// The media source is bound to a different resource than the controller.
    #[error("Media source is bound to '{actual}', controller expects '{expected}'")]
    ResourceMismatch { expected: String, actual: String },

    // ========================================================================
    // Intent Validation Errors
    // ========================================================================
    /// Seek target is negative or not a number.
    #[error("Invalid seek position: {0}")]
    InvalidSeekPosition(f64),

    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    /// Playback rate outside the supported set.
    #[error("Unsupported playback rate: {0} (expected 0.5, 1, 1.5 or 2)")]
    InvalidPlaybackRate(f64),

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// The media source failed to execute a command.
    #[error("Media source error: {0}")]
    Bridge(#[from] BridgeError),

    /// Player configuration was rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
