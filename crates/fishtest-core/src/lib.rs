//! Fishtest Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Subprocesses
//! - Filesystem layout
//!
//! All types here describe the work a worker is handed by the coordination
//! server and the statistics it reports back.

pub mod error;
pub mod ids;
pub mod stats;
pub mod task;
pub mod worker;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::{RunId, TaskId};
pub use stats::RunStats;
pub use task::{Run, RunArgs, Task};
pub use worker::WorkerInfo;
