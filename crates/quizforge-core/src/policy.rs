//! Difficulty adaptation policy.
//!
//! A tabular value estimate over (current tier, next tier) pairs, updated
//! with a one-step temporal-difference rule and queried epsilon-greedily.
//!
//! The update bootstraps against the tier the policy itself would pick next
//! from the answered tier, not the tier the session actually presents next.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::model::Difficulty;

/// Seconds after which an answer earns no speed bonus.
pub const LATENCY_HORIZON_SECS: f64 = 60.0;

type TableRepr = BTreeMap<Difficulty, BTreeMap<Difficulty, f64>>;

/// Expected discounted reward for every (from, to) tier pair.
///
/// Backed by a fixed 3x3 array, so every pair always has an entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "TableRepr", try_from = "TableRepr")]
pub struct ValueTable {
    values: [[f64; 3]; 3],
}

impl ValueTable {
    /// A table with every entry at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, from: Difficulty, to: Difficulty) -> f64 {
        self.values[from.index()][to.index()]
    }

    /// All estimates for transitions out of `from`, in tier order.
    pub fn row(&self, from: Difficulty) -> [f64; 3] {
        self.values[from.index()]
    }

    /// The highest-valued next tier. Ties go to the earliest tier.
    pub fn best(&self, from: Difficulty) -> Difficulty {
        let row = self.row(from);
        let mut best = Difficulty::Easy;
        for tier in Difficulty::ALL {
            if row[tier.index()] > row[best.index()] {
                best = tier;
            }
        }
        best
    }

    /// Largest estimate in a row.
    pub fn max_value(&self, from: Difficulty) -> f64 {
        self.get(from, self.best(from))
    }

    fn set(&mut self, from: Difficulty, to: Difficulty, value: f64) {
        self.values[from.index()][to.index()] = value;
    }
}

impl From<ValueTable> for TableRepr {
    fn from(table: ValueTable) -> Self {
        Difficulty::ALL
            .into_iter()
            .map(|from| {
                let row = Difficulty::ALL
                    .into_iter()
                    .map(|to| (to, table.get(from, to)))
                    .collect();
                (from, row)
            })
            .collect()
    }
}

impl TryFrom<TableRepr> for ValueTable {
    type Error = String;

    fn try_from(repr: TableRepr) -> Result<Self, Self::Error> {
        let mut table = ValueTable::new();
        for from in Difficulty::ALL {
            let row = repr
                .get(&from)
                .ok_or_else(|| format!("value table is missing row {from}"))?;
            for to in Difficulty::ALL {
                let value = row
                    .get(&to)
                    .ok_or_else(|| format!("value table is missing entry {from} -> {to}"))?;
                table.set(from, to, *value);
            }
        }
        Ok(table)
    }
}

/// Reward for one completed attempt.
///
/// `(+1 | -1) * (1 + time_factor) * tier multiplier`, where the time factor
/// falls linearly from 1 at zero latency to 0 at [`LATENCY_HORIZON_SECS`].
/// Fast correct answers earn the most; fast wrong answers cost the most.
pub fn reward(correct: bool, latency_secs: f64, difficulty: Difficulty) -> f64 {
    let base = if correct { 1.0 } else { -1.0 };
    // f64::max drops NaN, so a NaN latency lands on 0.
    let time_factor = (1.0 - latency_secs / LATENCY_HORIZON_SECS)
        .max(0.0)
        .min(1.0);
    base * (1.0 + time_factor) * difficulty.reward_multiplier()
}

/// Result of feeding one attempt into the policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyStep {
    pub reward: f64,
    /// Tier the update bootstrapped against.
    pub chosen: Difficulty,
}

/// Epsilon-greedy tier selection over a learned [`ValueTable`].
#[derive(Debug, Clone)]
pub struct DifficultyPolicy {
    table: ValueTable,
    epsilon: f64,
    learning_rate: f64,
    discount_factor: f64,
}

impl DifficultyPolicy {
    pub fn new(epsilon: f64, learning_rate: f64, discount_factor: f64) -> Self {
        Self {
            table: ValueTable::new(),
            epsilon,
            learning_rate,
            discount_factor,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.epsilon,
            config.learning_rate,
            config.discount_factor,
        )
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    /// Pick the tier to ask next given the tier just answered.
    pub fn select_next_difficulty<R: Rng + ?Sized>(
        &self,
        current: Difficulty,
        rng: &mut R,
    ) -> Difficulty {
        if rng.random_bool(self.epsilon) {
            Difficulty::ALL[rng.random_range(0..Difficulty::ALL.len())]
        } else {
            self.table.best(current)
        }
    }

    /// One-step TD update of `table[current][chosen]`.
    pub fn update(&mut self, current: Difficulty, chosen: Difficulty, reward: f64) {
        let old = self.table.get(current, chosen);
        let target = reward + self.discount_factor * self.table.max_value(chosen);
        let updated = old + self.learning_rate * (target - old);
        self.table.set(current, chosen, updated);
        tracing::debug!(%current, %chosen, reward, old, updated, "value table updated");
    }

    /// Score an attempt, pick the bootstrap tier, and apply the update.
    pub fn observe<R: Rng + ?Sized>(
        &mut self,
        current: Difficulty,
        correct: bool,
        latency_secs: f64,
        rng: &mut R,
    ) -> PolicyStep {
        let reward = reward(correct, latency_secs, current);
        let chosen = self.select_next_difficulty(current, rng);
        self.update(current, chosen, reward);
        PolicyStep { reward, chosen }
    }
}
