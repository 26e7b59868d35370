//! Attendance (scan) endpoint handler.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::verification::{
    MarkAttendanceRequest, VerificationOutcome, VerificationResponse,
};
use domain::services::AttendanceVerifier;
use persistence::repositories::{AdmissionRepository, SessionRepository};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Caller;
use crate::middleware::metrics::record_verification_outcome;

/// Verify the caller's presence for a session and record the admission.
///
/// POST /api/v1/attendance
///
/// The body always carries an `outcome` field:
/// - `admitted` → 201
/// - `already_marked` → 200
/// - `invalid_session` → 404
/// - `expired` → 410
/// - `out_of_range` → 403
///
/// Malformed coordinates are rejected with 400 before any lookup. Storage
/// failures return 503 and the attempt may be retried.
pub async fn mark_attendance(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(request): Json<MarkAttendanceRequest>,
) -> Result<(StatusCode, Json<VerificationResponse>), ApiError> {
    request.validate()?;
    let attempt = request.into_attempt(identity.subject, identity.email)?;

    let verifier = AttendanceVerifier::new(
        SessionRepository::new(state.pool.clone()),
        AdmissionRepository::new(state.pool.clone()),
    )
    .with_options(state.config.verification.verifier_options());

    let outcome = verifier.verify(attempt).await?;
    record_verification_outcome(outcome.as_str());

    Ok((outcome_status(&outcome), Json(outcome.into())))
}

fn outcome_status(outcome: &VerificationOutcome) -> StatusCode {
    match outcome {
        VerificationOutcome::Admitted { .. } => StatusCode::CREATED,
        VerificationOutcome::AlreadyMarked => StatusCode::OK,
        VerificationOutcome::InvalidSession => StatusCode::NOT_FOUND,
        VerificationOutcome::Expired => StatusCode::GONE,
        VerificationOutcome::OutOfRange { .. } => StatusCode::FORBIDDEN,
    }
}
