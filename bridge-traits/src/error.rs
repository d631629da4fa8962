//! Errors reported by platform bridge implementations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The platform lacks the capability (no audio output, listener limit).
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// `play()` was declined synchronously, e.g. by an autoplay policy.
    #[error("Playback request rejected: {0}")]
    PlayRejected(String),

    /// `unsubscribe` was called with an id the source does not know.
    #[error("Unknown media listener: {0}")]
    UnknownListener(String),
}

impl BridgeError {
    /// Whether the error reports a declined play command rather than a
    /// malfunction.
    pub fn is_play_rejection(&self) -> bool {
        matches!(self, BridgeError::PlayRejected(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_rejection_is_classified() {
        assert!(BridgeError::PlayRejected("NotAllowedError".into()).is_play_rejection());
        assert!(!BridgeError::OperationFailed("decode".into()).is_play_rejection());
    }
}
