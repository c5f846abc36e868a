//! Concrete question selection within a difficulty tier.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::error::EngineError;
use crate::model::{Difficulty, QuestionBank};

/// Picks a question of a given tier, avoiding the most recently asked ones.
#[derive(Debug, Clone, Copy)]
pub struct QuestionSelector {
    recent_window: usize,
}

impl QuestionSelector {
    pub fn new(recent_window: usize) -> Self {
        Self { recent_window }
    }

    /// Choose a bank position uniformly among eligible questions of `difficulty`.
    ///
    /// `recent_history` holds bank positions in the order they were asked.
    /// Questions in its last `recent_window` entries are skipped unless that
    /// would leave nothing to choose from.
    pub fn select<R: Rng + ?Sized>(
        &self,
        bank: &QuestionBank,
        difficulty: Difficulty,
        recent_history: &[usize],
        rng: &mut R,
    ) -> Result<usize, EngineError> {
        let tier = bank.positions_for(difficulty);
        if tier.is_empty() {
            return Err(EngineError::BankExhausted { difficulty });
        }

        let window_start = recent_history.len().saturating_sub(self.recent_window);
        let recent = &recent_history[window_start..];
        let fresh: Vec<usize> = tier
            .iter()
            .copied()
            .filter(|pos| !recent.contains(pos))
            .collect();

        let candidates = if fresh.is_empty() {
            tracing::debug!(%difficulty, "every {difficulty} question asked recently, allowing repeats");
            &tier
        } else {
            &fresh
        };

        candidates
            .choose(rng)
            .copied()
            .ok_or(EngineError::BankExhausted { difficulty })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{bank, question};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn picks_only_requested_tier() {
        let bank = bank(3);
        let selector = QuestionSelector::new(5);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let pos = selector
                .select(&bank, Difficulty::Medium, &[], &mut rng)
                .unwrap();
            assert_eq!(bank.at(pos).unwrap().difficulty, Difficulty::Medium);
        }
    }

    #[test]
    fn skips_recent_questions() {
        let bank = bank(3);
        let selector = QuestionSelector::new(5);
        let mut rng = StdRng::seed_from_u64(2);
        // Easy positions are 0, 1, 2.
        for _ in 0..50 {
            let pos = selector
                .select(&bank, Difficulty::Easy, &[0, 1], &mut rng)
                .unwrap();
            assert_eq!(pos, 2);
        }
    }

    #[test]
    fn only_last_window_entries_are_excluded() {
        let bank = bank(2);
        let selector = QuestionSelector::new(3);
        let mut rng = StdRng::seed_from_u64(3);
        // Position 0 was asked, but fell out of the three-entry window.
        let history = [0, 1, 4, 5];
        let mut seen = HashSet::new();
        for _ in 0..50 {
            seen.insert(
                selector
                    .select(&bank, Difficulty::Easy, &history, &mut rng)
                    .unwrap(),
            );
        }
        assert_eq!(seen, HashSet::from([0]));
    }

    #[test]
    fn falls_back_when_whole_tier_is_recent() {
        let bank = bank(2);
        let selector = QuestionSelector::new(5);
        let mut rng = StdRng::seed_from_u64(4);
        let mut seen = HashSet::new();
        for _ in 0..100 {
            seen.insert(
                selector
                    .select(&bank, Difficulty::Hard, &[4, 5], &mut rng)
                    .unwrap(),
            );
        }
        assert_eq!(seen, HashSet::from([4, 5]));
    }

    #[test]
    fn empty_tier_is_bank_exhausted() {
        let bank = QuestionBank::new(vec![question("e1", Difficulty::Easy)]).unwrap();
        let selector = QuestionSelector::new(5);
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(
            selector.select(&bank, Difficulty::Hard, &[], &mut rng),
            Err(EngineError::BankExhausted {
                difficulty: Difficulty::Hard
            })
        );
    }
}
