//! Admission repository for database operations.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;

use domain::errors::{LedgerError, StorageError};
use domain::models::admission::{AdmissionRecord, NewAdmission};
use domain::services::AdmissionLedger;

use crate::entities::AdmissionEntity;
use crate::metrics::QueryTimer;

/// Repository for admission database operations.
#[derive(Clone)]
pub struct AdmissionRepository {
    pool: PgPool,
}

impl AdmissionRepository {
    /// Creates a new AdmissionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether an admission exists for the (session, claimant) pair.
    pub async fn exists(&self, session_id: &str, claimant_id: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("admission_exists");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM admissions WHERE session_id = $1 AND claimant_id = $2
            )
            "#,
        )
        .bind(session_id)
        .bind(claimant_id)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Inserts an admission. Returns `None` when the pair is already recorded.
    ///
    /// The unique constraint on (session_id, claimant_id) arbitrates between
    /// concurrent inserts; `ON CONFLICT DO NOTHING` turns the loser into an
    /// empty result instead of an error.
    pub async fn insert(&self, entry: &NewAdmission) -> Result<Option<AdmissionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_admission");
        let result = sqlx::query_as::<_, AdmissionEntity>(
            r#"
            INSERT INTO admissions (session_id, claimant_id, claimant_email, latitude, longitude,
                                    accuracy_meters, distance_meters, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (session_id, claimant_id) DO NOTHING
            RETURNING id, session_id, claimant_id, claimant_email, latitude, longitude,
                      accuracy_meters, distance_meters, recorded_at
            "#,
        )
        .bind(&entry.session_id)
        .bind(&entry.claimant_id)
        .bind(&entry.claimant_email)
        .bind(entry.reported_position.latitude())
        .bind(entry.reported_position.longitude())
        .bind(entry.reported_accuracy_meters)
        .bind(entry.distance_meters)
        .bind(entry.recorded_at)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Admissions for a session, newest first.
    pub async fn find_by_session(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<AdmissionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_admissions_by_session");
        let result = sqlx::query_as::<_, AdmissionEntity>(
            r#"
            SELECT id, session_id, claimant_id, claimant_email, latitude, longitude,
                   accuracy_meters, distance_meters, recorded_at
            FROM admissions
            WHERE session_id = $1
            ORDER BY recorded_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Number of admissions recorded for a session.
    pub async fn count_by_session(&self, session_id: &str) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_admissions_by_session");
        let result =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admissions WHERE session_id = $1")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await;
        timer.finish(result)
    }
}

fn storage_error(operation: &str, err: sqlx::Error) -> StorageError {
    error!(operation = operation, error = %err, "Admission storage failure");
    StorageError::new(format!("{operation}: {err}"))
}

fn into_record(entity: AdmissionEntity) -> Result<AdmissionRecord, StorageError> {
    let id = entity.id;
    AdmissionRecord::try_from(entity).map_err(|err| {
        error!(admission_id = id, error = %err, "Stored admission has invalid position");
        StorageError::new(format!("corrupt admission row {id}: {err}"))
    })
}

#[async_trait]
impl AdmissionLedger for AdmissionRepository {
    async fn has_admitted(
        &self,
        session_id: &str,
        claimant_id: &str,
    ) -> Result<bool, StorageError> {
        self.exists(session_id, claimant_id)
            .await
            .map_err(|e| storage_error("has_admitted", e))
    }

    async fn record(&self, entry: NewAdmission) -> Result<AdmissionRecord, LedgerError> {
        match self
            .insert(&entry)
            .await
            .map_err(|e| storage_error("record_admission", e))?
        {
            Some(entity) => Ok(into_record(entity)?),
            None => Err(LedgerError::AlreadyRecorded),
        }
    }

    async fn list_for_session(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<AdmissionRecord>, StorageError> {
        self.find_by_session(session_id, limit)
            .await
            .map_err(|e| storage_error("list_admissions", e))?
            .into_iter()
            .map(into_record)
            .collect()
    }

    async fn count_for_session(&self, session_id: &str) -> Result<i64, StorageError> {
        self.count_by_session(session_id)
            .await
            .map_err(|e| storage_error("count_admissions", e))
    }
}
