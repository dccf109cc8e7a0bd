//! Win/loss/draw counters.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Cumulative game outcomes from the candidate engine's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunStats {
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
}

impl RunStats {
    pub fn new(wins: u64, losses: u64, draws: u64) -> Self {
        Self {
            wins,
            losses,
            draws,
        }
    }

    /// Number of games these counters account for.
    pub fn total(&self) -> u64 {
        self.wins + self.losses + self.draws
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Add for RunStats {
    type Output = RunStats;

    fn add(self, rhs: RunStats) -> RunStats {
        RunStats {
            wins: self.wins + rhs.wins,
            losses: self.losses + rhs.losses,
            draws: self.draws + rhs.draws,
        }
    }
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, rhs: RunStats) {
        *self = *self + rhs;
    }
}
