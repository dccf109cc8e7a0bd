//! Worker identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials and capacity of the worker executing a task.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerInfo {
    /// Account the worker reports under.
    pub username: String,

    /// Password sent along with every report.
    pub password: String,

    /// Number of games the match tool may play in parallel.
    pub concurrency: u32,
}

impl WorkerInfo {
    /// Create a new WorkerInfo.
    pub fn new(username: impl Into<String>, password: impl Into<String>, concurrency: u32) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            concurrency,
        }
    }
}

impl fmt::Debug for WorkerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerInfo")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("concurrency", &self.concurrency)
            .finish()
    }
}
