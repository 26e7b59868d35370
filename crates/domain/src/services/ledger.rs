//! Attendance ledger contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{LedgerError, StorageError};
use crate::models::admission::{AdmissionRecord, NewAdmission};

/// Records admissions, at most one per (session, claimant).
#[async_trait]
pub trait AdmissionLedger: Send + Sync {
    /// Whether the claimant already has an admission for the session.
    async fn has_admitted(&self, session_id: &str, claimant_id: &str)
        -> Result<bool, StorageError>;

    /// Inserts an admission atomically.
    ///
    /// Among concurrent calls for the same (session, claimant) pair exactly one
    /// succeeds; the rest return `LedgerError::AlreadyRecorded`. Implementations
    /// must enforce this in storage, not with an in-process lock.
    async fn record(&self, entry: NewAdmission) -> Result<AdmissionRecord, LedgerError>;

    /// Admissions for a session, newest first, at most `limit`.
    async fn list_for_session(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<AdmissionRecord>, StorageError>;

    /// Total admissions recorded for a session.
    async fn count_for_session(&self, session_id: &str) -> Result<i64, StorageError>;
}

#[async_trait]
impl<T: AdmissionLedger + ?Sized> AdmissionLedger for Arc<T> {
    async fn has_admitted(
        &self,
        session_id: &str,
        claimant_id: &str,
    ) -> Result<bool, StorageError> {
        (**self).has_admitted(session_id, claimant_id).await
    }

    async fn record(&self, entry: NewAdmission) -> Result<AdmissionRecord, LedgerError> {
        (**self).record(entry).await
    }

    async fn list_for_session(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<AdmissionRecord>, StorageError> {
        (**self).list_for_session(session_id, limit).await
    }

    async fn count_for_session(&self, session_id: &str) -> Result<i64, StorageError> {
        (**self).count_for_session(session_id).await
    }
}
