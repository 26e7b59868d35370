//! Domain services for Geo Attendance.
//!
//! Services contain business logic that operates on domain models, plus the
//! storage contracts the persistence layer implements.

pub mod geo;
pub mod ledger;
pub mod memory;
pub mod registry;
pub mod verification;

pub use geo::{haversine_distance, verify_geofence, GeofenceVerdict, EARTH_RADIUS_METERS};
pub use ledger::AdmissionLedger;
pub use memory::{MemoryAdmissionLedger, MemorySessionRegistry};
pub use registry::SessionRegistry;
pub use verification::{AttendanceVerifier, Clock, FixedClock, SystemClock, VerifierOptions};
