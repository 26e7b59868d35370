//! Persistence layer for the attendance service.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - Postgres-backed session registry and admission ledger

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
