//! Repository Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use verification::{UserDirectory, VerificationResult};

/// Registered identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub name: String,
    /// Absent for users imported from older registry files
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
}

/// One verification attempt as logged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub confidence: f64,
    pub rounds: usize,
}

/// Repository for users and verification history
pub struct Repository {
    users: Mutex<BTreeMap<String, UserRecord>>,
    verifications: Mutex<VecDeque<VerificationRecord>>,
    /// Registry file rewritten on every registration
    users_file: Option<PathBuf>,
    max_verification_records: usize,
    next_verification_id: Mutex<i64>,
}

impl Repository {
    /// Create an empty in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory repository");
        Self {
            users: Mutex::new(BTreeMap::new()),
            verifications: Mutex::new(VecDeque::with_capacity(1000)),
            users_file: None,
            max_verification_records: 10_000,
            next_verification_id: Mutex::new(1),
        }
    }

    /// Open a repository whose user registry lives in a JSON file.
    ///
    /// A missing file starts an empty registry; it is created on the first
    /// registration.
    pub fn with_users_file(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut repo = Self::new();

        match fs::read(path) {
            Ok(bytes) => {
                let records: Vec<UserRecord> = serde_json::from_slice(&bytes)
                    .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                let mut users = repo.lock_users()?;
                for record in records {
                    users.insert(record.user_id.clone(), record);
                }
                info!("Loaded {} users from {}", users.len(), path.display());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("User registry {} not found, starting empty", path.display());
            }
            Err(e) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        }

        repo.users_file = Some(path.to_path_buf());
        Ok(repo)
    }

    /// Register or rename a user
    pub fn insert_user(&self, user_id: &str, name: &str) -> Result<UserRecord, StorageError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(StorageError::InvalidRecord("user_id is empty".to_string()));
        }

        let record = UserRecord {
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            registered_at: Some(Utc::now()),
        };

        let mut users = self.lock_users()?;
        if let Some(path) = &self.users_file {
            let mut staged = users.clone();
            staged.insert(record.user_id.clone(), record.clone());
            save_users(path, &staged)?;
            *users = staged;
        } else {
            users.insert(record.user_id.clone(), record.clone());
        }

        debug!("Registered user {}", record.user_id);
        Ok(record)
    }

    pub fn get_user_name(&self, user_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock_users()?.get(user_id).map(|u| u.name.clone()))
    }

    /// All users ordered by id
    pub fn list_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        Ok(self.lock_users()?.values().cloned().collect())
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().map(|u| u.len()).unwrap_or(0)
    }

    /// Log a verification outcome, returning its id
    pub fn record_verification(
        &self,
        result: &VerificationResult,
        rounds: usize,
    ) -> Result<i64, StorageError> {
        let mut log = self
            .verifications
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;
        let mut next_id = self
            .next_verification_id
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;

        let id = *next_id;
        *next_id += 1;

        while log.len() >= self.max_verification_records {
            log.pop_front();
        }

        log.push_back(VerificationRecord {
            id,
            timestamp: Utc::now(),
            status: result.status.as_str().to_string(),
            user_id: result.user_id.clone(),
            user_name: result.user_name.clone(),
            confidence: result.confidence,
            rounds,
        });
        debug!("Logged verification {}", id);
        Ok(id)
    }

    /// Most recent verifications first
    pub fn recent_verifications(&self, limit: usize) -> Result<Vec<VerificationRecord>, StorageError> {
        let log = self
            .verifications
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;
        Ok(log.iter().rev().take(limit).cloned().collect())
    }

    pub fn verification_count(&self) -> usize {
        self.verifications.lock().map(|l| l.len()).unwrap_or(0)
    }

    fn lock_users(&self) -> Result<MutexGuard<'_, BTreeMap<String, UserRecord>>, StorageError> {
        self.users
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl UserDirectory for Repository {
    fn display_name(&self, user_id: &str) -> Option<String> {
        self.get_user_name(user_id).ok().flatten()
    }
}

fn save_users(path: &Path, users: &BTreeMap<String, UserRecord>) -> Result<(), StorageError> {
    let records: Vec<&UserRecord> = users.values().collect();
    let json = serde_json::to_vec_pretty(&records)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;

    // write-then-rename so a crash never leaves a truncated registry
    let tmp = path.with_extension("json.tmp");
    let io_err = |e: std::io::Error| StorageError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    };
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}
