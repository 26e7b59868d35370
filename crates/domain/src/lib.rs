//! Domain layer for Geo Attendance.
//!
//! This crate contains:
//! - Domain models (Session, AdmissionRecord, Coordinate)
//! - Geofence math and the verification orchestrator
//! - Storage contracts and domain error types

pub mod errors;
pub mod models;
pub mod services;
