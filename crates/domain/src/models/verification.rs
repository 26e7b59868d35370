//! Verification attempt and outcome types.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::admission::{AdmissionRecord, AdmissionResponse};
use super::coordinate::{Coordinate, CoordinateError};

/// Request payload for a scan: the presented session plus the claimant's position.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    /// Session identifier as decoded from the QR payload. Unknown or malformed
    /// values yield an `invalid_session` outcome rather than a validation error.
    pub session_id: String,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy_meters: Option<f64>,
}

/// Everything the orchestrator needs for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationAttempt {
    pub session_id: String,
    pub claimant_id: String,
    pub claimant_email: Option<String>,
    pub position: Coordinate,
    /// Informational only; never part of the verdict.
    pub accuracy_meters: Option<f64>,
}

impl MarkAttendanceRequest {
    /// Combines the request with the authenticated claimant identity.
    pub fn into_attempt(
        self,
        claimant_id: String,
        claimant_email: Option<String>,
    ) -> Result<VerificationAttempt, CoordinateError> {
        Ok(VerificationAttempt {
            session_id: self.session_id.trim().to_string(),
            claimant_id,
            claimant_email,
            position: Coordinate::new(self.latitude, self.longitude)?,
            accuracy_meters: self.accuracy_meters,
        })
    }
}

/// Terminal state of a verification attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// Claimant admitted and recorded.
    Admitted {
        distance_meters: i32,
        label: String,
        record: AdmissionRecord,
    },
    /// Session id is unknown or malformed.
    InvalidSession,
    /// Session is past its expiry (or closed).
    Expired,
    /// Claimant is outside the geofence.
    OutOfRange {
        distance_meters: i32,
        allowed_meters: f64,
    },
    /// Claimant already has an admission for this session.
    AlreadyMarked,
}

impl VerificationOutcome {
    /// Stable snake_case name, used in responses, logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationOutcome::Admitted { .. } => "admitted",
            VerificationOutcome::InvalidSession => "invalid_session",
            VerificationOutcome::Expired => "expired",
            VerificationOutcome::OutOfRange { .. } => "out_of_range",
            VerificationOutcome::AlreadyMarked => "already_marked",
        }
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, VerificationOutcome::Admitted { .. })
    }
}

/// Wire form of a [`VerificationOutcome`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationResponse {
    #[serde(rename_all = "camelCase")]
    Admitted {
        distance_meters: i32,
        label: String,
        admission: AdmissionResponse,
    },
    InvalidSession {
        message: String,
    },
    Expired {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    OutOfRange {
        distance_meters: i32,
        allowed_meters: f64,
        message: String,
    },
    AlreadyMarked {
        message: String,
    },
}

impl From<VerificationOutcome> for VerificationResponse {
    fn from(outcome: VerificationOutcome) -> Self {
        match outcome {
            VerificationOutcome::Admitted {
                distance_meters,
                label,
                record,
            } => VerificationResponse::Admitted {
                distance_meters,
                label,
                admission: record.into(),
            },
            VerificationOutcome::InvalidSession => VerificationResponse::InvalidSession {
                message: "Invalid session".to_string(),
            },
            VerificationOutcome::Expired => VerificationResponse::Expired {
                message: "Session has expired".to_string(),
            },
            VerificationOutcome::OutOfRange {
                distance_meters,
                allowed_meters,
            } => VerificationResponse::OutOfRange {
                distance_meters,
                allowed_meters,
                message: format!(
                    "You are {}m away; attendance requires being within {}m",
                    distance_meters, allowed_meters
                ),
            },
            VerificationOutcome::AlreadyMarked => VerificationResponse::AlreadyMarked {
                message: "Attendance already marked for this session".to_string(),
            },
        }
    }
}
