//! Domain error types.

use thiserror::Error;

/// Failure at the storage boundary. Always transient from the caller's view.
#[derive(Debug, Clone, Error)]
#[error("Storage unavailable: {0}")]
pub struct StorageError(pub String);

impl StorageError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Errors from the session registry.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("Session '{0}' already exists")]
    DuplicateId(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from the attendance ledger.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Admission already recorded for this session and claimant")]
    AlreadyRecorded,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors that abort a verification attempt without producing an outcome.
#[derive(Debug, Clone, Error)]
pub enum VerificationError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<StorageError> for VerificationError {
    fn from(err: StorageError) -> Self {
        VerificationError::StorageUnavailable(err.0)
    }
}
