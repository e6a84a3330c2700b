//! Route handlers

pub mod health;
pub mod metrics;
pub mod models;
pub mod users;
pub mod verifications;
pub mod verify;
