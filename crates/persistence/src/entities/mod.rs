//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod admission;
pub mod session;

pub use admission::AdmissionEntity;
pub use session::SessionEntity;
