//! Great-circle distance and geofence checks.

use crate::models::coordinate::Coordinate;
use crate::models::session::effective_radius;

/// Mean Earth radius used for all distance calculations.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two points, rounded to the nearest meter.
///
/// NaN components propagate to a NaN result.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    haversine_raw(a.latitude(), a.longitude(), b.latitude(), b.longitude())
}

fn haversine_raw(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    (EARTH_RADIUS_METERS * c).round()
}

/// Result of checking a claimant position against a geofence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceVerdict {
    pub admitted: bool,
    pub distance_meters: i32,
    pub allowed_meters: f64,
}

/// Checks whether `claimant` lies within `radius_meters` of `origin`.
///
/// The boundary is inclusive. A missing or non-positive radius is replaced by
/// the default radius.
pub fn verify_geofence(
    claimant: Coordinate,
    origin: Coordinate,
    radius_meters: Option<f64>,
) -> GeofenceVerdict {
    let allowed_meters = effective_radius(radius_meters);
    let distance = haversine_distance(claimant, origin);

    GeofenceVerdict {
        admitted: distance <= allowed_meters,
        distance_meters: distance as i32,
        allowed_meters,
    }
}
