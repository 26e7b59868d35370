//! Attendance session domain model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::coordinate::{Coordinate, CoordinateError};

/// Radius applied when a session is created without a usable radius.
pub const DEFAULT_RADIUS_METERS: f64 = 50.0;

/// Prefix for generated session identifiers.
pub const SESSION_ID_PREFIX: &str = "SESSION_";

/// An issuer-created attendance window tied to one geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub issuer_id: String,
    pub label: String,
    pub origin: Coordinate,
    pub radius_meters: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Returns true once `now` is strictly past the expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A validated session ready to be stored by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub session_id: String,
    pub issuer_id: String,
    pub label: String,
    pub origin: Coordinate,
    pub radius_meters: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Limits applied when turning a request into a [`NewSession`].
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub default_duration_minutes: i64,
    pub max_duration_minutes: i64,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            default_duration_minutes: 60,
            max_duration_minutes: 1440,
        }
    }
}

/// Reasons a create request cannot become a session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionInputError {
    #[error("Provide either expiresAt or durationMinutes, not both")]
    ConflictingExpiry,

    #[error("expiresAt must be in the future")]
    ExpiryNotInFuture,

    #[error("Session cannot last longer than {0} minutes")]
    DurationTooLong(i64),

    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
}

/// Default active status for new sessions.
fn default_active() -> bool {
    true
}

lazy_static::lazy_static! {
    pub static ref SESSION_ID_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();
}

/// Returns true if the value could be a session identifier.
pub fn is_well_formed_session_id(value: &str) -> bool {
    SESSION_ID_REGEX.is_match(value)
}

/// Generates a session identifier such as `SESSION_7KQ2MXP9HD`.
pub fn generate_session_id() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let chars: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789"; // Avoiding confusing chars: 0, O, I, 1

    let suffix: String = (0..10)
        .map(|_| {
            let idx = rng.gen_range(0..chars.len());
            chars[idx] as char
        })
        .collect();

    format!("{}{}", SESSION_ID_PREFIX, suffix)
}

/// Returns the radius that will actually be enforced.
///
/// Missing, zero, negative and non-finite radii fall back to the default
/// rather than rejecting every claimant.
pub fn effective_radius(radius_meters: Option<f64>) -> f64 {
    match radius_meters {
        Some(r) if r.is_finite() && r > 0.0 => r,
        _ => DEFAULT_RADIUS_METERS,
    }
}

/// Request payload for creating a session.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Caller-chosen identifier; generated when omitted.
    #[validate(regex(
        path = *SESSION_ID_REGEX,
        message = "Session ID must be 1-64 letters, digits, '_' or '-'"
    ))]
    pub session_id: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Label must be 1-200 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub label: String,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_radius"))]
    pub radius_meters: Option<f64>,

    pub expires_at: Option<DateTime<Utc>>,

    /// Upper bound comes from `SessionPolicy`, checked in `into_new_session`.
    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration_minutes: Option<i64>,

    #[serde(default = "default_active")]
    pub active: bool,
}

impl CreateSessionRequest {
    /// Resolves defaults and expiry against `now`, producing a storable session.
    ///
    /// Call after `validate()`; field-level checks are not repeated here.
    pub fn into_new_session(
        self,
        issuer_id: &str,
        now: DateTime<Utc>,
        policy: &SessionPolicy,
    ) -> Result<NewSession, SessionInputError> {
        let origin = Coordinate::new(self.latitude, self.longitude)?;

        let expires_at = match (self.expires_at, self.duration_minutes) {
            (Some(_), Some(_)) => return Err(SessionInputError::ConflictingExpiry),
            (Some(at), None) => at,
            (None, Some(minutes)) if minutes > policy.max_duration_minutes => {
                return Err(SessionInputError::DurationTooLong(
                    policy.max_duration_minutes,
                ))
            }
            (None, Some(minutes)) => now + Duration::minutes(minutes),
            (None, None) => now + Duration::minutes(policy.default_duration_minutes),
        };

        if expires_at <= now {
            return Err(SessionInputError::ExpiryNotInFuture);
        }
        if expires_at - now > Duration::minutes(policy.max_duration_minutes) {
            return Err(SessionInputError::DurationTooLong(
                policy.max_duration_minutes,
            ));
        }

        Ok(NewSession {
            session_id: self.session_id.unwrap_or_else(generate_session_id),
            issuer_id: issuer_id.to_string(),
            label: self.label.trim().to_string(),
            origin,
            radius_meters: effective_radius(self.radius_meters),
            active: self.active,
            created_at: now,
            expires_at,
        })
    }
}

/// Response payload for session operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub issuer_id: String,
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(s: Session) -> Self {
        Self {
            session_id: s.session_id,
            issuer_id: s.issuer_id,
            label: s.label,
            latitude: s.origin.latitude(),
            longitude: s.origin.longitude(),
            radius_meters: s.radius_meters,
            active: s.active,
            created_at: s.created_at,
            expires_at: s.expires_at,
        }
    }
}

/// Response for listing sessions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionResponse>,
    /// Number of sessions in this page, not the caller's overall total.
    pub count: usize,
}

/// Query parameters for bounded, newest-first listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub limit: Option<i64>,
}

impl ListQuery {
    /// Clamps the requested limit into `1..=max`, using `default` when absent.
    pub fn resolve_limit(&self, default: i64, max: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, max)
    }
}
