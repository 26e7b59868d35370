//! Session repository for database operations.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;

use domain::errors::{RegistryError, StorageError};
use domain::models::session::{NewSession, Session};
use domain::services::SessionRegistry;

use crate::entities::SessionEntity;
use crate::metrics::QueryTimer;

const SESSION_COLUMNS: &str = "session_id, issuer_id, label, latitude, longitude, radius_meters, \
                               active, created_at, expires_at";

/// Repository for session database operations.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new SessionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a session. Returns `None` if the session ID is already taken.
    ///
    /// Uses `ON CONFLICT DO NOTHING` so two concurrent creates with the same
    /// identifier cannot both succeed.
    pub async fn insert(&self, session: &NewSession) -> Result<Option<SessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_session");
        let query = format!(
            r#"
            INSERT INTO sessions (session_id, issuer_id, label, latitude, longitude,
                                  radius_meters, active, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (session_id) DO NOTHING
            RETURNING {SESSION_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, SessionEntity>(&query)
            .bind(&session.session_id)
            .bind(&session.issuer_id)
            .bind(&session.label)
            .bind(session.origin.latitude())
            .bind(session.origin.longitude())
            .bind(session.radius_meters)
            .bind(session.active)
            .bind(session.created_at)
            .bind(session.expires_at)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Find a session by its identifier.
    pub async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_session_by_id");
        let query = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = $1");
        let result = sqlx::query_as::<_, SessionEntity>(&query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Sessions created by an issuer, newest first.
    pub async fn find_by_issuer(
        &self,
        issuer_id: &str,
        limit: i64,
    ) -> Result<Vec<SessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_sessions_by_issuer");
        let query = format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sessions
            WHERE issuer_id = $1
            ORDER BY created_at DESC, session_id DESC
            LIMIT $2
            "#
        );
        let result = sqlx::query_as::<_, SessionEntity>(&query)
            .bind(issuer_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }
}

fn storage_error(operation: &str, err: sqlx::Error) -> StorageError {
    error!(operation = operation, error = %err, "Session storage failure");
    StorageError::new(format!("{operation}: {err}"))
}

fn into_session(entity: SessionEntity) -> Result<Session, StorageError> {
    let session_id = entity.session_id.clone();
    Session::try_from(entity).map_err(|err| {
        error!(session_id = %session_id, error = %err, "Stored session has invalid origin");
        StorageError::new(format!("corrupt session row {session_id}: {err}"))
    })
}

#[async_trait]
impl SessionRegistry for SessionRepository {
    async fn create(&self, session: NewSession) -> Result<Session, RegistryError> {
        match self
            .insert(&session)
            .await
            .map_err(|e| storage_error("create_session", e))?
        {
            Some(entity) => Ok(into_session(entity)?),
            None => Err(RegistryError::DuplicateId(session.session_id)),
        }
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, StorageError> {
        self.find_by_session_id(session_id)
            .await
            .map_err(|e| storage_error("get_session", e))?
            .map(into_session)
            .transpose()
    }

    async fn list_by_issuer(
        &self,
        issuer_id: &str,
        limit: i64,
    ) -> Result<Vec<Session>, StorageError> {
        self.find_by_issuer(issuer_id, limit)
            .await
            .map_err(|e| storage_error("list_sessions", e))?
            .into_iter()
            .map(into_session)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_columns_cover_entity() {
        for column in [
            "session_id",
            "issuer_id",
            "label",
            "latitude",
            "longitude",
            "radius_meters",
            "active",
            "created_at",
            "expires_at",
        ] {
            assert!(SESSION_COLUMNS.contains(column), "missing {column}");
        }
    }
}
