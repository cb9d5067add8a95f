//! Error types for pmsync-core.

use thiserror::Error;

/// Core error types.
///
/// Collaborators report failures through this type so that the scheduler and
/// the channel managers can log and retry without knowing the concrete cause.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Refresh failed ({kind}): {reason}")]
    Refresh { kind: &'static str, reason: String },

    #[error("Message processing failed: {0}")]
    Processing(String),
}

impl CoreError {
    /// Shorthand for a refresh failure of the given kind.
    pub fn refresh(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Refresh {
            kind,
            reason: reason.into(),
        }
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
