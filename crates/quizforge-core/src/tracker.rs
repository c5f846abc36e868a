//! Attempt history and performance aggregates.
//!
//! The attempt log is append-only and is the source of truth. Per-question
//! tallies are kept incrementally; per-tier tallies are derived from the log
//! on read.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, Question};

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub question_id: String,
    /// Tier of the question when it was asked.
    pub difficulty: Difficulty,
    pub correct: bool,
    /// Response latency in seconds. Never negative.
    pub latency_secs: f64,
    pub answered_at: DateTime<Utc>,
}

/// Running counts from which accuracy and mean latency are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub attempts: u32,
    pub correct: u32,
    pub total_latency_secs: f64,
}

impl PerformanceStats {
    fn add(&mut self, correct: bool, latency_secs: f64) {
        self.attempts += 1;
        self.correct += u32::from(correct);
        self.total_latency_secs += latency_secs;
    }

    /// Fraction answered correctly; 0 with no attempts.
    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.correct as f64 / self.attempts as f64
        }
    }

    /// Mean latency in seconds; 0 with no attempts.
    pub fn mean_latency_secs(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.total_latency_secs / self.attempts as f64
        }
    }

    pub fn wrong(&self) -> u32 {
        self.attempts - self.correct
    }
}

/// Snapshot of a wrong answer, kept for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrongAnswer {
    pub question_id: String,
    pub prompt: String,
    pub submitted_option: String,
    pub correct_option: String,
    pub options: BTreeMap<String, String>,
    pub difficulty: Difficulty,
    pub latency_secs: f64,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Records every attempt of one session.
#[derive(Debug, Clone, Default)]
pub struct PerformanceTracker {
    history: Vec<AttemptRecord>,
    per_question: HashMap<String, PerformanceStats>,
    wrong_answers: Vec<WrongAnswer>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer and return whether it was correct.
    pub fn record(
        &mut self,
        question: &Question,
        submitted: &str,
        latency_secs: f64,
        answered_at: DateTime<Utc>,
    ) -> bool {
        let correct = question.is_correct(submitted);

        self.per_question
            .entry(question.id.clone())
            .or_default()
            .add(correct, latency_secs);

        self.history.push(AttemptRecord {
            question_id: question.id.clone(),
            difficulty: question.difficulty,
            correct,
            latency_secs,
            answered_at,
        });

        if !correct {
            self.wrong_answers.push(WrongAnswer {
                question_id: question.id.clone(),
                prompt: question.prompt.clone(),
                submitted_option: submitted.to_string(),
                correct_option: question.correct_option.clone(),
                options: question.options.clone(),
                difficulty: question.difficulty,
                latency_secs,
                explanation: question.explanation.clone(),
            });
        }

        correct
    }

    /// Every attempt, oldest first.
    pub fn history(&self) -> &[AttemptRecord] {
        &self.history
    }

    pub fn wrong_answers(&self) -> &[WrongAnswer] {
        &self.wrong_answers
    }

    /// Tallies keyed by question id, for questions with at least one attempt.
    pub fn per_question(&self) -> &HashMap<String, PerformanceStats> {
        &self.per_question
    }

    pub fn question_stats(&self, question_id: &str) -> Option<&PerformanceStats> {
        self.per_question.get(question_id)
    }

    /// Tally over every attempt at a tier; `None` if the tier was never asked.
    pub fn difficulty_stats(&self, difficulty: Difficulty) -> Option<PerformanceStats> {
        let mut stats = PerformanceStats::default();
        for attempt in self.history.iter().filter(|a| a.difficulty == difficulty) {
            stats.add(attempt.correct, attempt.latency_secs);
        }
        (stats.attempts > 0).then_some(stats)
    }

    /// Tally over the whole session.
    pub fn overall(&self) -> PerformanceStats {
        let mut stats = PerformanceStats::default();
        for attempt in &self.history {
            stats.add(attempt.correct, attempt.latency_secs);
        }
        stats
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
