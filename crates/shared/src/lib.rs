//! Shared utilities and common types for the Geo Attendance backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Identity token verification
//! - Common validation logic

pub mod jwt;
pub mod validation;
