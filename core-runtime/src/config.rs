//! # Player Configuration
//!
//! Configuration for a single player instance.
//!
//! ## Overview
//!
//! A `PlayerConfig` names the resource a controller is bound to and carries
//! the presentation constants the control surface needs (seek fallback range,
//! slider steps, title) plus the commit policy for play commands. It can be
//! built in code with [`PlayerConfigBuilder`] or loaded from JSON; both paths
//! validate before returning.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::{CommitPolicy, PlayerConfig};
//!
//! let config = PlayerConfig::builder()
//!     .resource_id("/1.mp3")
//!     .title("My Audio")
//!     .commit_policy(CommitPolicy::Optimistic)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.seek_fallback_max, 100.0);
//! ```
//!
//! ## Error Handling
//!
//! The builder fails fast when the resource identifier is missing:
//!
//! ```should_panic
//! use core_runtime::config::PlayerConfig;
//!
//! let config = PlayerConfig::builder()
//!     .title("No resource")
//!     .build()
//!     .expect("Should fail - missing resource id");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use serde::{Deserialize, Serialize};

/// How the controller commits a play intent into `is_playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Flip `is_playing` as soon as the play command is issued; roll back if
    /// the media source rejects it.
    #[default]
    Optimistic,
    /// Mark the play as pending and flip `is_playing` only when the media
    /// source reports that playback actually started.
    Acknowledged,
}

/// Configuration for one player instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Identifier of the audio resource (path or URL). Required.
    pub resource_id: String,

    /// Heading rendered above the controls.
    ///
    /// Default: "My Audio".
    #[serde(default = "default_title")]
    pub title: String,

    /// Upper bound of the seek slider while the duration is still unknown.
    ///
    /// Default: 100 seconds.
    #[serde(default = "default_seek_fallback_max")]
    pub seek_fallback_max: f64,

    /// Seek slider step in seconds.
    ///
    /// Default: 1 second.
    #[serde(default = "default_seek_step")]
    pub seek_step: f64,

    /// Volume slider step.
    ///
    /// Default: 0.01.
    #[serde(default = "default_volume_step")]
    pub volume_step: f32,

    /// Play commit policy.
    ///
    /// Default: optimistic.
    #[serde(default)]
    pub commit_policy: CommitPolicy,

    /// Capacity of the state-change event bus.
    ///
    /// Default: 100 events.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl PlayerConfig {
    /// Start building a configuration.
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    /// Configuration for `resource_id` with every other field defaulted.
    pub fn for_resource(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            title: default_title(),
            seek_fallback_max: default_seek_fallback_max(),
            seek_step: default_seek_step(),
            volume_step: default_volume_step(),
            commit_policy: CommitPolicy::default(),
            event_buffer_size: default_event_buffer_size(),
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.resource_id.trim().is_empty() {
            return Err(Error::Config("resource_id must not be empty".to_string()));
        }

        if !(self.seek_fallback_max.is_finite() && self.seek_fallback_max > 0.0) {
            return Err(Error::Config(format!(
                "seek_fallback_max must be a positive number, got {}",
                self.seek_fallback_max
            )));
        }

        if !(self.seek_step.is_finite() && self.seek_step > 0.0) {
            return Err(Error::Config(format!(
                "seek_step must be a positive number, got {}",
                self.seek_step
            )));
        }

        if !(self.volume_step > 0.0 && self.volume_step <= 1.0) {
            return Err(Error::Config(format!(
                "volume_step must be in (0, 1], got {}",
                self.volume_step
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config("event_buffer_size must be > 0".to_string()));
        }

        Ok(())
    }
}

/// Builder for [`PlayerConfig`].
#[derive(Debug, Default)]
pub struct PlayerConfigBuilder {
    resource_id: Option<String>,
    title: Option<String>,
    seek_fallback_max: Option<f64>,
    seek_step: Option<f64>,
    volume_step: Option<f32>,
    commit_policy: Option<CommitPolicy>,
    event_buffer_size: Option<usize>,
}

impl PlayerConfigBuilder {
    /// Set the resource identifier (required).
    pub fn resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn seek_fallback_max(mut self, seconds: f64) -> Self {
        self.seek_fallback_max = Some(seconds);
        self
    }

    pub fn seek_step(mut self, seconds: f64) -> Self {
        self.seek_step = Some(seconds);
        self
    }

    pub fn volume_step(mut self, step: f32) -> Self {
        self.volume_step = Some(step);
        self
    }

    pub fn commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit_policy = Some(policy);
        self
    }

    pub fn event_buffer_size(mut self, capacity: usize) -> Self {
        self.event_buffer_size = Some(capacity);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when no resource id was provided and
    /// [`Error::Config`] when a value fails validation.
    pub fn build(self) -> Result<PlayerConfig> {
        let resource_id = self.resource_id.ok_or_else(|| Error::CapabilityMissing {
            capability: "resource_id".to_string(),
            message: "No audio resource configured. Call `resource_id(...)` with the \
                      path or URL the player should control."
                .to_string(),
        })?;

        let config = PlayerConfig {
            resource_id,
            title: self.title.unwrap_or_else(default_title),
            seek_fallback_max: self
                .seek_fallback_max
                .unwrap_or_else(default_seek_fallback_max),
            seek_step: self.seek_step.unwrap_or_else(default_seek_step),
            volume_step: self.volume_step.unwrap_or_else(default_volume_step),
            commit_policy: self.commit_policy.unwrap_or_default(),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or_else(default_event_buffer_size),
        };

        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_title() -> String {
    "My Audio".to_string()
}

fn default_seek_fallback_max() -> f64 {
    100.0
}

fn default_seek_step() -> f64 {
    1.0
}

fn default_volume_step() -> f32 {
    0.01
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}
