//! Session entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::coordinate::{Coordinate, CoordinateError};
use domain::models::session::Session;

/// Database row mapping for the sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct SessionEntity {
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

impl TryFrom<SessionEntity> for Session {
    type Error = CoordinateError;

    fn try_from(entity: SessionEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            origin: Coordinate::new(entity.latitude, entity.longitude)?,
            session_id: entity.session_id,
            issuer_id: entity.issuer_id,
            label: entity.label,
            radius_meters: entity.radius_meters,
            active: entity.active,
            created_at: entity.created_at,
            expires_at: entity.expires_at,
        })
    }
}
