//! Chain step counts.
use crate::recom::StepOutcome;
use serde::Serialize;
use std::ops::Add;

/// Tallies of what happened over a chain's rounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChainCounts {
    /// Rounds that committed a recombination.
    pub committed: usize,
    /// Rounds whose attempt budget ran out (self-loops).
    pub rejected: usize,
    /// Spanning trees drawn in rejected rounds.
    pub trees: usize,
    /// Cut edges tested without success.
    pub failed_cuts: usize,
}

impl ChainCounts {
    /// Records the outcome of one round.
    pub fn observe(&mut self, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Committed(_) => self.committed += 1,
            StepOutcome::Rejected {
                trees, attempts, ..
            } => {
                self.rejected += 1;
                self.trees += trees;
                self.failed_cuts += attempts;
            }
        }
    }

    /// The total number of rounds observed.
    pub fn rounds(&self) -> usize {
        self.committed + self.rejected
    }

    /// The fraction of rounds that committed (NaN before any round).
    pub fn acceptance_rate(&self) -> f64 {
        self.committed as f64 / self.rounds() as f64
    }
}

impl Add for ChainCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        ChainCounts {
            committed: self.committed + other.committed,
            rejected: self.rejected + other.rejected,
            trees: self.trees + other.trees,
            failed_cuts: self.failed_cuts + other.failed_cuts,
        }
    }
}
