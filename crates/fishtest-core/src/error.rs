//! Core domain errors.

use thiserror::Error;

/// Core domain errors for the fishtest worker.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Task index is not part of the run.
    #[error("Task {task_id} not found in run {run_id}")]
    TaskNotFound { run_id: String, task_id: usize },
}
