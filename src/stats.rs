//! Lifetime toss statistics
//!
//! In-memory only. The front end may persist the JSON form however it likes.

use serde::{Deserialize, Serialize};

use crate::sim::{Outcome, SimResult};

/// Heads/tails counters across runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total: u64,
    pub heads: u64,
    pub tails: u64,
}

impl AggregateStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a resolved outcome. Returns false (and counts nothing) for Unresolved.
    pub fn record(&mut self, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Heads => self.heads += 1,
            Outcome::Tails => self.tails += 1,
            Outcome::Unresolved => return false,
        }
        self.total += 1;
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Fraction of heads (0.0 when nothing has been counted)
    pub fn heads_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.heads as f64 / self.total as f64
        }
    }

    pub fn tails_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.tails as f64 / self.total as f64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore counters saved by the front end. Inconsistent totals are rebuilt from heads + tails.
    pub fn from_json(json: &str) -> SimResult<Self> {
        let mut stats: Self = serde_json::from_str(json)?;
        if stats.heads + stats.tails != stats.total {
            log::warn!(
                "Stats total {} does not match heads {} + tails {}, recomputing",
                stats.total,
                stats.heads,
                stats.tails
            );
            stats.total = stats.heads + stats.tails;
        }
        Ok(stats)
    }
}
