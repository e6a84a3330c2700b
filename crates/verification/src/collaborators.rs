//! External collaborators the engine informs or queries

use std::collections::HashMap;
use std::time::Duration;

/// Resolves identity ids to display names
pub trait UserDirectory: Send + Sync {
    /// Display name for `user_id`, or `None` if the id is not registered
    fn display_name(&self, user_id: &str) -> Option<String>;
}

impl UserDirectory for HashMap<String, String> {
    fn display_name(&self, user_id: &str) -> Option<String> {
        self.get(user_id).cloned()
    }
}

/// Chamber flush actuator, told to run a purge cycle after each attempt
pub trait ChamberPurge: Send + Sync {
    fn request_purge(&self, duration: Duration);
}

/// Actuator stand-in for deployments without a fan
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPurge;

impl ChamberPurge for NoPurge {
    fn request_purge(&self, _duration: Duration) {}
}
