use thiserror::Error;

/// Why a session operation did not apply. The same outcome is always mirrored
/// into the session status message.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("validation failed: {0}")]
    Validation(&'static str),
    #[error("remote {operation} failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("another operation is in flight")]
    Busy,
}

impl SessionError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}
