//! Error types for the worker pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the current task.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Transport-level failure or non-success HTTP status while downloading.
    #[error("Download of '{url}' failed: {message}")]
    Fetch { url: String, message: String },

    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The server answered with an empty body.
    #[error("Zero length download {url}")]
    EmptyPayload { url: String },

    /// The asset index has no entry with the requested path.
    #[error("Item {0} not found")]
    AssetNotFound(String),

    /// The asset index or blob response could not be understood.
    #[error("Invalid asset '{name}': {reason}")]
    InvalidAsset { name: String, reason: String },

    /// A downloaded archive could not be read or unpacked.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The source snapshot has no `src/` directory.
    #[error("No source root found in snapshot of {revision}")]
    SourceRootMissing { revision: String },

    /// The build command exited with a non-zero status.
    #[error("Build of {revision} failed with exit code {code:?}")]
    BuildFailed { revision: String, code: Option<i32> },

    /// The build succeeded but left no engine binary behind.
    #[error("Build of {} produced no engine at {}", .revision, .path.display())]
    EngineMissing { revision: String, path: PathBuf },

    /// The engine's bench node count differs from the expected value.
    #[error("Wrong bench in {} Expected: {} Got: {}", .engine.display(), .expected, .actual)]
    SignatureMismatch {
        engine: PathBuf,
        expected: String,
        actual: String,
    },

    /// The match tool exited with a non-zero status.
    #[error("Match tool exited with code {code:?}: {stderr}")]
    MatchToolFailed { code: Option<i32>, stderr: String },

    /// Failed to launch a subprocess.
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Task descriptor problem.
    #[error(transparent)]
    Core(#[from] fishtest_core::CoreError),
}

impl WorkerError {
    /// Whether another download attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::EmptyPayload { .. })
    }
}

/// Failure to deliver a progress report. Never aborts a task.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("update_task request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("update_task rejected with HTTP {0}")]
    Status(u16),
}

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;
