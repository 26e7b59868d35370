//! Session registry contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{RegistryError, StorageError};
use crate::models::session::{NewSession, Session};

/// Stores and retrieves time-bounded sessions keyed by session id.
///
/// Implementations own session records exclusively; sessions are immutable
/// once created.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Stores a new session. Fails with `DuplicateId` if the id is taken.
    async fn create(&self, session: NewSession) -> Result<Session, RegistryError>;

    /// Looks up a session. `Ok(None)` means unknown, which is not an error.
    async fn get(&self, session_id: &str) -> Result<Option<Session>, StorageError>;

    /// Sessions created by `issuer_id`, newest first, at most `limit`.
    async fn list_by_issuer(
        &self,
        issuer_id: &str,
        limit: i64,
    ) -> Result<Vec<Session>, StorageError>;
}

#[async_trait]
impl<T: SessionRegistry + ?Sized> SessionRegistry for Arc<T> {
    async fn create(&self, session: NewSession) -> Result<Session, RegistryError> {
        (**self).create(session).await
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, StorageError> {
        (**self).get(session_id).await
    }

    async fn list_by_issuer(
        &self,
        issuer_id: &str,
        limit: i64,
    ) -> Result<Vec<Session>, StorageError> {
        (**self).list_by_issuer(issuer_id, limit).await
    }
}
