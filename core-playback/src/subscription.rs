//! Scoped listener registrations on a media source.

use bridge_traits::media::{ListenerId, MediaListener, MediaSignal, MediaSource};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Owns a set of listener registrations and removes them when released or
/// dropped, whichever comes first.
pub struct SubscriptionSet {
    source: Arc<dyn MediaSource>,
    ids: Vec<ListenerId>,
}

impl SubscriptionSet {
    pub fn new(source: Arc<dyn MediaSource>) -> Self {
        Self {
            source,
            ids: Vec::new(),
        }
    }

    /// Register `listener` for `signal`. On failure the registrations made so
    /// far stay owned by `self` and are removed when it is dropped.
    pub fn subscribe(
        &mut self,
        signal: MediaSignal,
        listener: MediaListener,
    ) -> bridge_traits::error::Result<ListenerId> {
        let id = self.source.subscribe(signal, listener)?;
        self.ids.push(id);
        Ok(id)
    }

    /// Register the same listener on every signal in `signals`.
    pub fn subscribe_all(
        &mut self,
        signals: &[MediaSignal],
        listener: MediaListener,
    ) -> bridge_traits::error::Result<()> {
        for signal in signals {
            self.subscribe(*signal, Arc::clone(&listener))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Remove every registration. Idempotent.
    pub fn release(&mut self) {
        for id in self.ids.drain(..) {
            if let Err(e) = self.source.unsubscribe(id) {
                warn!(listener = %id, error = %e, "Failed to remove media listener");
            }
        }
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for SubscriptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionSet")
            .field("resource_id", &self.source.resource_id())
            .field("listeners", &self.ids.len())
            .finish()
    }
}
