//! Session endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::admission::AttendanceReportResponse;
use domain::models::session::{
    is_well_formed_session_id, CreateSessionRequest, ListQuery, ListSessionsResponse, Session,
    SessionResponse,
};
use domain::services::{AdmissionLedger, SessionRegistry};
use persistence::repositories::{AdmissionRepository, SessionRepository};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Caller;
use crate::middleware::metrics::record_session_created;

/// Create an attendance session owned by the caller.
///
/// POST /api/v1/sessions
///
/// Returns 201 with the stored session. Returns 409 if the caller-chosen
/// session ID is taken.
pub async fn create_session(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    request.validate()?;

    let policy = state.config.verification.session_policy();
    let new_session = request.into_new_session(&identity.subject, Utc::now(), &policy)?;

    let registry = SessionRepository::new(state.pool.clone());
    let session = registry.create(new_session).await?;

    record_session_created();
    info!(
        session_id = %session.session_id,
        issuer_id = %session.issuer_id,
        radius_meters = session.radius_meters,
        expires_at = %session.expires_at,
        "Session created"
    );

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// List the caller's sessions, newest first.
///
/// GET /api/v1/sessions?limit=N
pub async fn list_sessions(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListSessionsResponse>, ApiError> {
    let limits = &state.config.verification;
    let limit = query.resolve_limit(limits.default_list_limit, limits.max_list_limit);

    let registry = SessionRepository::new(state.pool.clone());
    let sessions: Vec<SessionResponse> = registry
        .list_by_issuer(&identity.subject, limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListSessionsResponse {
        count: sessions.len(),
        sessions,
    }))
}

/// Fetch one session. Any authenticated caller may read it, since claimants
/// already hold the identifier from the QR code.
///
/// GET /api/v1/sessions/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    Caller(_identity): Caller,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = find_session(&state, &session_id).await?;
    Ok(Json(session.into()))
}

/// Admission report for a session. Only its issuer may read it.
///
/// GET /api/v1/sessions/:session_id/attendance?limit=N
pub async fn get_attendance_report(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(session_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<AttendanceReportResponse>, ApiError> {
    let session = find_session(&state, &session_id).await?;

    if session.issuer_id != identity.subject {
        warn!(
            session_id = %session.session_id,
            caller = %identity.subject,
            "Attendance report requested by non-issuer"
        );
        return Err(ApiError::Forbidden(
            "Only the session issuer can view attendance".to_string(),
        ));
    }

    let limits = &state.config.verification;
    let limit = query.resolve_limit(limits.default_list_limit, limits.max_list_limit);

    let ledger = AdmissionRepository::new(state.pool.clone());
    let total = ledger.count_for_session(&session.session_id).await?;
    let admissions = ledger
        .list_for_session(&session.session_id, limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(AttendanceReportResponse {
        session_id: session.session_id,
        label: session.label,
        total,
        admissions,
    }))
}

async fn find_session(state: &AppState, session_id: &str) -> Result<Session, ApiError> {
    let not_found = || ApiError::NotFound(format!("Session '{}' not found", session_id));

    if !is_well_formed_session_id(session_id) {
        debug!("Malformed session id in path");
        return Err(not_found());
    }

    SessionRepository::new(state.pool.clone())
        .get(session_id)
        .await?
        .ok_or_else(not_found)
}
