//! In-memory registry and ledger.
//!
//! Used by tests and local tooling. Uniqueness is enforced under a single
//! mutex, so these stores only hold for one process; deployments use the
//! Postgres repositories.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::{LedgerError, RegistryError, StorageError};
use crate::models::admission::{AdmissionRecord, NewAdmission};
use crate::models::session::{NewSession, Session};
use crate::services::ledger::AdmissionLedger;
use crate::services::registry::SessionRegistry;

/// Session registry backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemorySessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
    unavailable: AtomicBool,
}

impl MemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with a storage error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::new("session store offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionRegistry for MemorySessionRegistry {
    async fn create(&self, session: NewSession) -> Result<Session, RegistryError> {
        self.check_available()?;
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| StorageError::new("session store poisoned"))?;

        if sessions.contains_key(&session.session_id) {
            return Err(RegistryError::DuplicateId(session.session_id));
        }

        let stored = Session {
            session_id: session.session_id.clone(),
            issuer_id: session.issuer_id,
            label: session.label,
            origin: session.origin,
            radius_meters: session.radius_meters,
            active: session.active,
            created_at: session.created_at,
            expires_at: session.expires_at,
        };
        sessions.insert(session.session_id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, StorageError> {
        self.check_available()?;
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| StorageError::new("session store poisoned"))?;
        Ok(sessions.get(session_id).cloned())
    }

    async fn list_by_issuer(
        &self,
        issuer_id: &str,
        limit: i64,
    ) -> Result<Vec<Session>, StorageError> {
        self.check_available()?;
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| StorageError::new("session store poisoned"))?;

        let mut matching: Vec<Session> = sessions
            .values()
            .filter(|s| s.issuer_id == issuer_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.session_id.cmp(&a.session_id))
        });
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }
}

/// Attendance ledger backed by a `HashMap` keyed on (session, claimant).
#[derive(Debug, Default)]
pub struct MemoryAdmissionLedger {
    records: Mutex<HashMap<(String, String), AdmissionRecord>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
}

impl MemoryAdmissionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with a storage error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored admissions across all sessions.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::new("attendance store offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AdmissionLedger for MemoryAdmissionLedger {
    async fn has_admitted(
        &self,
        session_id: &str,
        claimant_id: &str,
    ) -> Result<bool, StorageError> {
        self.check_available()?;
        let records = self
            .records
            .lock()
            .map_err(|_| StorageError::new("attendance store poisoned"))?;
        Ok(records.contains_key(&(session_id.to_string(), claimant_id.to_string())))
    }

    async fn record(&self, entry: NewAdmission) -> Result<AdmissionRecord, LedgerError> {
        self.check_available()?;
        let mut records = self
            .records
            .lock()
            .map_err(|_| StorageError::new("attendance store poisoned"))?;

        let key = (entry.session_id.clone(), entry.claimant_id.clone());
        if records.contains_key(&key) {
            return Err(LedgerError::AlreadyRecorded);
        }

        let record = AdmissionRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            session_id: entry.session_id,
            claimant_id: entry.claimant_id,
            claimant_email: entry.claimant_email,
            reported_position: entry.reported_position,
            reported_accuracy_meters: entry.reported_accuracy_meters,
            distance_meters: entry.distance_meters,
            recorded_at: entry.recorded_at,
        };
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn list_for_session(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<AdmissionRecord>, StorageError> {
        self.check_available()?;
        let records = self
            .records
            .lock()
            .map_err(|_| StorageError::new("attendance store poisoned"))?;

        let mut matching: Vec<AdmissionRecord> = records
            .values()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(b.id.cmp(&a.id)));
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }

    async fn count_for_session(&self, session_id: &str) -> Result<i64, StorageError> {
        self.check_available()?;
        let records = self
            .records
            .lock()
            .map_err(|_| StorageError::new("attendance store poisoned"))?;
        Ok(records.values().filter(|r| r.session_id == session_id).count() as i64)
    }
}
