//! Domain models for Geo Attendance.

pub mod admission;
pub mod coordinate;
pub mod session;
pub mod verification;

pub use admission::{AdmissionRecord, NewAdmission};
pub use coordinate::{Coordinate, CoordinateError};
pub use session::{NewSession, Session};
pub use verification::{VerificationAttempt, VerificationOutcome};
