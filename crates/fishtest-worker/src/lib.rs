//! Fishtest worker task pipeline.
//!
//! Given a run and one of its tasks, the worker:
//! - installs the opening book and match tool into the testing directory,
//! - builds the baseline and candidate engines from source snapshots,
//! - checks their bench signatures,
//! - plays the remaining games, reporting cumulative statistics as they arrive.

pub mod archive;
pub mod assets;
pub mod builder;
pub mod config;
pub mod error;
pub mod fetch;
pub mod games;
pub mod platform;
pub mod reporter;
pub mod score;
pub mod signature;

pub use assets::AssetInstaller;
pub use builder::EngineBuilder;
pub use config::Config;
pub use error::{ReportError, WorkerError, WorkerResult};
pub use fetch::Fetcher;
pub use games::{MatchRunner, RunOutcome};
pub use platform::Platform;
pub use reporter::{HttpReporter, ProgressReporter};
pub use score::{ScoreLine, StatsAccumulator};
pub use signature::verify_signature;
