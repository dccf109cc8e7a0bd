//! Match tool score lines.
//!
//! The match tool prints a running summary after every finished game:
//!
//! ```text
//! Score of Stockfish  130212 64bit vs base: 1701 - 1715 - 6161  [0.499] 9577
//! ```
//!
//! Counts are cumulative for the current invocation and seen from the first
//! engine's side, which is the candidate.

use std::sync::LazyLock;

use fishtest_core::RunStats;
use regex::Regex;
use tracing::warn;

/// Substring identifying summary lines.
pub const SCORE_MARKER: &str = "Score";

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Score of (?P<engine>.+?) vs (?P<opponent>.+?):\s*(?P<wins>\d+)\s*-\s*(?P<losses>\d+)\s*-\s*(?P<draws>\d+)(?:\s*\[(?P<ratio>[0-9.]+)\]\s*(?P<games>\d+))?",
    )
    .expect("invalid SCORE_RE pattern")
});

/// A parsed summary line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreLine {
    pub engine: String,
    pub opponent: String,
    /// Outcomes of the current invocation only.
    pub stats: RunStats,
    /// Score ratio printed in brackets.
    pub ratio: Option<f64>,
    /// Games played so far, as printed after the ratio.
    pub games: Option<u64>,
}

impl ScoreLine {
    /// Parse a summary line. Returns `None` for anything else.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = SCORE_RE.captures(line.trim_end())?;
        let count = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u64>().ok());

        Some(Self {
            engine: caps["engine"].trim().to_string(),
            opponent: caps["opponent"].trim().to_string(),
            stats: RunStats::new(count("wins")?, count("losses")?, count("draws")?),
            ratio: caps.name("ratio").and_then(|m| m.as_str().parse().ok()),
            games: count("games"),
        })
    }
}

/// Folds score lines of one invocation into totals seeded with earlier results.
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    prior: RunStats,
    current: RunStats,
}

impl StatsAccumulator {
    pub fn new(prior: RunStats) -> Self {
        Self {
            prior,
            current: prior,
        }
    }

    /// Cumulative totals as of the last accepted line.
    pub fn current(&self) -> RunStats {
        self.current
    }

    /// Feed one output line; returns the new totals when it was an accepted score line.
    pub fn observe(&mut self, line: &str) -> Option<RunStats> {
        if !line.contains(SCORE_MARKER) {
            return None;
        }

        let Some(score) = ScoreLine::parse(line) else {
            warn!(line = %line.trim_end(), "Ignoring unparsable score line");
            return None;
        };

        let updated = self.prior + score.stats;
        if updated.total() < self.current.total() {
            warn!(
                line = %line.trim_end(),
                previous_total = self.current.total(),
                total = updated.total(),
                "Ignoring score line that would lower the game count"
            );
            return None;
        }

        self.current = updated;
        Some(updated)
    }
}
