//! Run and Task types.

use crate::{CoreError, RunId, RunStats, TaskId};
use serde::{Deserialize, Deserializer, Serialize};

/// Opening book used when the run does not name one.
pub const DEFAULT_BOOK: &str = "varied.bin";

/// Book depth used when the run does not set one.
pub const DEFAULT_BOOK_DEPTH: &str = "10";

/// A run compares two engine revisions; it is split into tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Run identifier.
    #[serde(rename = "_id")]
    pub id: RunId,

    /// Run-level arguments shared by every task.
    pub args: RunArgs,

    /// Tasks of this run, addressed by position.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Run {
    /// Look up a task by its position in the run.
    pub fn task(&self, task_id: TaskId) -> Result<&Task, CoreError> {
        self.tasks
            .get(task_id.index())
            .ok_or_else(|| CoreError::TaskNotFound {
                run_id: self.id.to_string(),
                task_id: task_id.index(),
            })
    }
}

/// Arguments describing how the games of a run are played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArgs {
    /// Time control passed verbatim to the match tool.
    pub tc: String,

    /// Opening book file name. Empty disables the book download.
    #[serde(default = "default_book")]
    pub book: String,

    /// Book depth passed verbatim to the match tool.
    #[serde(default = "default_book_depth", deserialize_with = "string_or_number")]
    pub book_depth: String,

    /// Revision of the baseline engine.
    pub resolved_base: String,

    /// Revision of the candidate engine.
    pub resolved_new: String,

    /// Expected bench node count of the baseline. Empty skips the check.
    #[serde(default, deserialize_with = "string_or_number")]
    pub base_signature: String,

    /// Expected bench node count of the candidate. Empty skips the check.
    #[serde(default, deserialize_with = "string_or_number")]
    pub new_signature: String,
}

fn default_book() -> String {
    DEFAULT_BOOK.to_string()
}

fn default_book_depth() -> String {
    DEFAULT_BOOK_DEPTH.to_string()
}

// The server is not consistent about quoting numeric arguments.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
    })
}

/// A slice of a run's games assigned to one worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Number of games this task should end up with.
    pub num_games: u64,

    /// Outcomes already recorded by earlier executions.
    #[serde(default)]
    pub stats: RunStats,
}

impl Task {
    pub fn new(num_games: u64) -> Self {
        Self {
            num_games,
            stats: RunStats::default(),
        }
    }

    /// Builder method to seed previously recorded outcomes.
    pub fn with_stats(mut self, stats: RunStats) -> Self {
        self.stats = stats;
        self
    }

    /// Games still to be played; zero once the recorded total reaches the target.
    pub fn games_remaining(&self) -> u64 {
        self.num_games.saturating_sub(self.stats.total())
    }

    pub fn is_complete(&self) -> bool {
        self.games_remaining() == 0
    }
}
