use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced to callers of the alert service.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Rejected before persistence; the prior record stays in effect.
    #[error("invalid value for `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("alert {0} not found")]
    NotFound(Uuid),

    /// Dismissal is terminal; the alert can no longer be mutated.
    #[error("alert {0} is dismissed")]
    Dismissed(Uuid),
}

/// Persistence substrate failure.
///
/// Absorbed by the store and preference manager, which fall back to
/// in-memory state for the session; never escapes the service facade.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("stored payload is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}
