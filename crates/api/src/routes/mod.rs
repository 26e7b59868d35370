//! HTTP route handlers.

pub mod attendance;
pub mod health;
pub mod sessions;
