//! Admission record domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::coordinate::Coordinate;

/// One successful presence confirmation for a claimant in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRecord {
    pub id: i64,
    pub session_id: String,
    pub claimant_id: String,
    pub claimant_email: Option<String>,
    pub reported_position: Coordinate,
    pub reported_accuracy_meters: Option<f64>,
    pub distance_meters: i32,
    pub recorded_at: DateTime<Utc>,
}

/// An admission about to be written to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAdmission {
    pub session_id: String,
    pub claimant_id: String,
    pub claimant_email: Option<String>,
    pub reported_position: Coordinate,
    pub reported_accuracy_meters: Option<f64>,
    pub distance_meters: i32,
    pub recorded_at: DateTime<Utc>,
}

/// Response payload for a single admission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    pub session_id: String,
    pub claimant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimant_email: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_meters: Option<f64>,
    pub distance_meters: i32,
    pub recorded_at: DateTime<Utc>,
}

impl From<AdmissionRecord> for AdmissionResponse {
    fn from(r: AdmissionRecord) -> Self {
        Self {
            session_id: r.session_id,
            claimant_id: r.claimant_id,
            claimant_email: r.claimant_email,
            latitude: r.reported_position.latitude(),
            longitude: r.reported_position.longitude(),
            accuracy_meters: r.reported_accuracy_meters,
            distance_meters: r.distance_meters,
            recorded_at: r.recorded_at,
        }
    }
}

/// Issuer-facing attendance report for one session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReportResponse {
    pub session_id: String,
    pub label: String,
    /// Total admissions recorded, independent of the page size.
    pub total: i64,
    pub admissions: Vec<AdmissionResponse>,
}
