//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Repository holding the opening books, the match tool and engine sources.
pub const FISHCOOKING_URL: &str = "https://api.github.com/repos/mcostalba/FishCooking";

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Coordination server base URL.
    pub remote: String,

    /// API base of the repository serving assets and source snapshots.
    pub repo_url: String,

    /// Git tree listing the downloadable assets.
    pub asset_tree: String,

    /// Directory holding the book, match tool, engines and results.
    pub testing_dir: PathBuf,

    /// Parent directory of per-build working directories.
    pub scratch_root: PathBuf,

    /// Download attempts before giving up.
    pub fetch_attempts: u32,

    /// Base delay between download attempts; attempt `n` waits `(n + 1)` units.
    pub backoff_unit: Duration,

    /// Upper bound on a single HTTP request, download or progress report.
    pub request_timeout: Duration,
}

impl Config {
    /// URL of the asset tree listing.
    pub fn asset_tree_url(&self) -> String {
        format!("{}/git/trees/{}", self.repo_url, self.asset_tree)
    }

    /// URL of the source snapshot of a revision.
    pub fn zipball_url(&self, revision: &str) -> String {
        format!("{}/zipball/{}", self.repo_url, revision)
    }

    /// URL of the progress report endpoint.
    pub fn update_task_url(&self) -> String {
        format!("{}/api/update_task", self.remote.trim_end_matches('/'))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: "http://localhost:6543".to_string(),
            repo_url: FISHCOOKING_URL.to_string(),
            asset_tree: "setup".to_string(),
            testing_dir: PathBuf::from("testing"),
            scratch_root: std::env::temp_dir(),
            fetch_attempts: 5,
            backoff_unit: Duration::from_secs(1),
            request_timeout: Duration::from_secs(60),
        }
    }
}
