//! Storage Layer
//!
//! Registered users and the verification log, kept in memory behind the
//! repository pattern. The user registry can be backed by a JSON file.

mod repository;

pub use repository::{Repository, UserRecord, VerificationRecord};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Lock error: {0}")]
    LockError(String),
    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}
