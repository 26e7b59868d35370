//! Admission entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::admission::AdmissionRecord;
use domain::models::coordinate::{Coordinate, CoordinateError};

/// Database row mapping for the admissions table.
#[derive(Debug, Clone, FromRow)]
pub struct AdmissionEntity {
    pub id: i64,
    pub session_id: String,
    pub claimant_id: String,
    pub claimant_email: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub distance_meters: i32,
    pub recorded_at: DateTime<Utc>,
}

impl TryFrom<AdmissionEntity> for AdmissionRecord {
    type Error = CoordinateError;

    fn try_from(entity: AdmissionEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            reported_position: Coordinate::new(entity.latitude, entity.longitude)?,
            session_id: entity.session_id,
            claimant_id: entity.claimant_id,
            claimant_email: entity.claimant_email,
            reported_accuracy_meters: entity.accuracy_meters,
            distance_meters: entity.distance_meters,
            recorded_at: entity.recorded_at,
        })
    }
}
