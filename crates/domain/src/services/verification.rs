//! Verification orchestrator.
//!
//! Each attempt runs a fixed sequence: lookup, expiry, geofence, duplicate
//! check, commit. The first failing step decides the outcome; nothing is
//! retried here.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::errors::{LedgerError, VerificationError};
use crate::models::admission::NewAdmission;
use crate::models::session::is_well_formed_session_id;
use crate::models::verification::{VerificationAttempt, VerificationOutcome};
use crate::services::geo::verify_geofence;
use crate::services::ledger::AdmissionLedger;
use crate::services::registry::SessionRegistry;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Behavior switches for the orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifierOptions {
    /// Treat sessions with `active = false` as expired.
    pub reject_inactive_sessions: bool,
}

/// Runs verification attempts against a registry and a ledger.
pub struct AttendanceVerifier<R, L, C = SystemClock> {
    registry: R,
    ledger: L,
    clock: C,
    options: VerifierOptions,
}

impl<R, L> AttendanceVerifier<R, L, SystemClock>
where
    R: SessionRegistry,
    L: AdmissionLedger,
{
    pub fn new(registry: R, ledger: L) -> Self {
        Self::with_clock(registry, ledger, SystemClock)
    }
}

impl<R, L, C> AttendanceVerifier<R, L, C>
where
    R: SessionRegistry,
    L: AdmissionLedger,
    C: Clock,
{
    pub fn with_clock(registry: R, ledger: L, clock: C) -> Self {
        Self {
            registry,
            ledger,
            clock,
            options: VerifierOptions::default(),
        }
    }

    pub fn with_options(mut self, options: VerifierOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs one attempt to a terminal outcome.
    ///
    /// Storage failures surface as `VerificationError::StorageUnavailable` and
    /// leave the ledger untouched or with exactly the record that was committed.
    pub async fn verify(
        &self,
        attempt: VerificationAttempt,
    ) -> Result<VerificationOutcome, VerificationError> {
        if !is_well_formed_session_id(&attempt.session_id) {
            debug!(claimant_id = %attempt.claimant_id, "Malformed session id presented");
            return Ok(VerificationOutcome::InvalidSession);
        }

        let session = match self.registry.get(&attempt.session_id).await? {
            Some(session) => session,
            None => {
                debug!(
                    session_id = %attempt.session_id,
                    claimant_id = %attempt.claimant_id,
                    "Unknown session presented"
                );
                return Ok(VerificationOutcome::InvalidSession);
            }
        };

        let now = self.clock.now();
        if session.is_expired_at(now) || (self.options.reject_inactive_sessions && !session.active)
        {
            debug!(
                session_id = %session.session_id,
                expires_at = %session.expires_at,
                active = session.active,
                "Session no longer accepting attendance"
            );
            return Ok(VerificationOutcome::Expired);
        }

        let verdict = verify_geofence(
            attempt.position,
            session.origin,
            Some(session.radius_meters),
        );
        if !verdict.admitted {
            warn!(
                session_id = %session.session_id,
                claimant_id = %attempt.claimant_id,
                distance_meters = verdict.distance_meters,
                allowed_meters = verdict.allowed_meters,
                "Claimant outside geofence"
            );
            return Ok(VerificationOutcome::OutOfRange {
                distance_meters: verdict.distance_meters,
                allowed_meters: verdict.allowed_meters,
            });
        }

        if self
            .ledger
            .has_admitted(&session.session_id, &attempt.claimant_id)
            .await?
        {
            return Ok(VerificationOutcome::AlreadyMarked);
        }

        let entry = NewAdmission {
            session_id: session.session_id.clone(),
            claimant_id: attempt.claimant_id,
            claimant_email: attempt.claimant_email,
            reported_position: attempt.position,
            reported_accuracy_meters: attempt.accuracy_meters,
            distance_meters: verdict.distance_meters,
            recorded_at: now,
        };

        match self.ledger.record(entry).await {
            Ok(record) => {
                info!(
                    session_id = %record.session_id,
                    claimant_id = %record.claimant_id,
                    distance_meters = record.distance_meters,
                    "Attendance recorded"
                );
                Ok(VerificationOutcome::Admitted {
                    distance_meters: record.distance_meters,
                    label: session.label,
                    record,
                })
            }
            // Lost the race against a concurrent attempt for the same pair.
            Err(LedgerError::AlreadyRecorded) => Ok(VerificationOutcome::AlreadyMarked),
            Err(LedgerError::Storage(e)) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StorageError;
    use crate::models::admission::AdmissionRecord;
    use crate::models::coordinate::Coordinate;
    use crate::models::session::NewSession;
    use crate::services::memory::{MemoryAdmissionLedger, MemorySessionRegistry};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap()
    }

    fn origin() -> Coordinate {
        Coordinate::new(18.516726, 73.856255).unwrap()
    }

    fn far_away() -> Coordinate {
        // 19,490 m north of the origin along the meridian.
        Coordinate::new(18.692004, 73.856255).unwrap()
    }

    fn session(id: &str, active: bool) -> NewSession {
        NewSession {
            session_id: id.to_string(),
            issuer_id: "issuer-1".to_string(),
            label: "Physics 101".to_string(),
            origin: origin(),
            radius_meters: 50.0,
            active,
            created_at: t0(),
            expires_at: t0() + Duration::hours(1),
        }
    }

    fn attempt(session_id: &str, claimant: &str, position: Coordinate) -> VerificationAttempt {
        VerificationAttempt {
            session_id: session_id.to_string(),
            claimant_id: claimant.to_string(),
            claimant_email: Some(format!("{}@example.com", claimant)),
            position,
            accuracy_meters: Some(10.0),
        }
    }

    async fn verifier_at(
        now: DateTime<Utc>,
    ) -> AttendanceVerifier<Arc<MemorySessionRegistry>, Arc<MemoryAdmissionLedger>, FixedClock>
    {
        let registry = Arc::new(MemorySessionRegistry::new());
        registry.create(session("SESSION_001", true)).await.unwrap();
        registry.create(session("SESSION_OFF", false)).await.unwrap();
        AttendanceVerifier::with_clock(
            registry,
            Arc::new(MemoryAdmissionLedger::new()),
            FixedClock(now),
        )
    }

    #[tokio::test]
    async fn test_admitted_at_origin() {
        let verifier = verifier_at(t0() + Duration::minutes(5)).await;

        let outcome = verifier
            .verify(attempt("SESSION_001", "student-1", origin()))
            .await
            .unwrap();

        match outcome {
            VerificationOutcome::Admitted {
                distance_meters,
                label,
                record,
            } => {
                assert_eq!(distance_meters, 0);
                assert_eq!(label, "Physics 101");
                assert_eq!(record.claimant_id, "student-1");
                assert_eq!(record.recorded_at, t0() + Duration::minutes(5));
                assert_eq!(record.reported_accuracy_meters, Some(10.0));
            }
            other => panic!("expected Admitted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_out_of_range_reports_distances() {
        let verifier = verifier_at(t0()).await;

        let outcome = verifier
            .verify(attempt("SESSION_001", "student-1", far_away()))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            VerificationOutcome::OutOfRange {
                distance_meters: 19_490,
                allowed_meters: 50.0
            }
        );
        assert!(verifier.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let verifier = verifier_at(t0()).await;

        let outcome = verifier
            .verify(attempt("SESSION_999", "student-1", origin()))
            .await
            .unwrap();
        assert_eq!(outcome, VerificationOutcome::InvalidSession);
    }

    #[tokio::test]
    async fn test_malformed_session_id_skips_storage() {
        let verifier = verifier_at(t0()).await;
        verifier.registry.set_unavailable(true);

        let outcome = verifier
            .verify(attempt("not a session!", "student-1", origin()))
            .await
            .unwrap();
        assert_eq!(outcome, VerificationOutcome::InvalidSession);
    }

    #[tokio::test]
    async fn test_rescan_already_marked() {
        let verifier = verifier_at(t0()).await;

        let first = verifier
            .verify(attempt("SESSION_001", "student-1", origin()))
            .await
            .unwrap();
        assert!(first.is_admitted());

        let second = verifier
            .verify(attempt("SESSION_001", "student-1", origin()))
            .await
            .unwrap();
        assert_eq!(second, VerificationOutcome::AlreadyMarked);
        assert_eq!(verifier.ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_expiry_checked_before_geofence() {
        let verifier = verifier_at(t0() + Duration::hours(2)).await;

        let outcome = verifier
            .verify(attempt("SESSION_001", "student-1", far_away()))
            .await
            .unwrap();
        assert_eq!(outcome, VerificationOutcome::Expired);
    }

    #[tokio::test]
    async fn test_expiry_boundary_still_open() {
        let verifier = verifier_at(t0() + Duration::hours(1)).await;

        let outcome = verifier
            .verify(attempt("SESSION_001", "student-1", origin()))
            .await
            .unwrap();
        assert!(outcome.is_admitted());
    }

    #[tokio::test]
    async fn test_inactive_session_ignored_by_default() {
        let verifier = verifier_at(t0()).await;

        let outcome = verifier
            .verify(attempt("SESSION_OFF", "student-1", origin()))
            .await
            .unwrap();
        assert!(outcome.is_admitted());
    }

    #[tokio::test]
    async fn test_inactive_session_rejected_when_enabled() {
        let verifier = verifier_at(t0()).await.with_options(VerifierOptions {
            reject_inactive_sessions: true,
        });

        let outcome = verifier
            .verify(attempt("SESSION_OFF", "student-1", origin()))
            .await
            .unwrap();
        assert_eq!(outcome, VerificationOutcome::Expired);

        let outcome = verifier
            .verify(attempt("SESSION_001", "student-1", origin()))
            .await
            .unwrap();
        assert!(outcome.is_admitted());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let verifier = verifier_at(t0()).await;
        verifier.ledger.set_unavailable(true);

        let result = verifier
            .verify(attempt("SESSION_001", "student-1", origin()))
            .await;
        assert!(matches!(
            result,
            Err(VerificationError::StorageUnavailable(_))
        ));
    }

    /// Ledger whose duplicate check always passes, forcing the commit to
    /// decide between racing attempts.
    struct RacingLedger(MemoryAdmissionLedger);

    #[async_trait]
    impl AdmissionLedger for RacingLedger {
        async fn has_admitted(&self, _: &str, _: &str) -> Result<bool, StorageError> {
            Ok(false)
        }

        async fn record(&self, entry: NewAdmission) -> Result<AdmissionRecord, LedgerError> {
            self.0.record(entry).await
        }

        async fn list_for_session(
            &self,
            session_id: &str,
            limit: i64,
        ) -> Result<Vec<AdmissionRecord>, StorageError> {
            self.0.list_for_session(session_id, limit).await
        }

        async fn count_for_session(&self, session_id: &str) -> Result<i64, StorageError> {
            self.0.count_for_session(session_id).await
        }
    }

    #[tokio::test]
    async fn test_lost_commit_race_is_already_marked() {
        let registry = MemorySessionRegistry::new();
        registry.create(session("SESSION_001", true)).await.unwrap();
        let verifier = Arc::new(AttendanceVerifier::with_clock(
            registry,
            RacingLedger(MemoryAdmissionLedger::new()),
            FixedClock(t0()),
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let verifier = verifier.clone();
            handles.push(tokio::spawn(async move {
                verifier
                    .verify(attempt("SESSION_001", "student-1", origin()))
                    .await
                    .unwrap()
            }));
        }

        let mut admitted = 0;
        let mut already = 0;
        for handle in handles {
            match handle.await.unwrap() {
                VerificationOutcome::Admitted { .. } => admitted += 1,
                VerificationOutcome::AlreadyMarked => already += 1,
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(already, 7);
        assert_eq!(verifier.ledger.0.count_for_session("SESSION_001").await.unwrap(), 1);
    }
}
