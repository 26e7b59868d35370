//! Repository implementations for database operations.

pub mod admission;
pub mod session;

pub use admission::AdmissionRepository;
pub use session::SessionRepository;
