//! One learner's adaptive session.
//!
//! Each turn consults the repetition queue first; only when nothing is due
//! does the difficulty policy pick a tier and the selector a question from it.
//! A session owns all of its mutable state, so sessions never interfere.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::model::{Difficulty, Question, QuestionBank};
use crate::policy::DifficultyPolicy;
use crate::repetition::{DueEntry, RepetitionQueue};
use crate::report::{self, ReportInput, SessionReport};
use crate::selector::QuestionSelector;
use crate::tracker::PerformanceTracker;

/// A question handed to the learner.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub question: &'a Question,
    /// Served from the repetition queue rather than the policy.
    pub review: bool,
    /// 1-based turn number, counting answered turns plus this one.
    pub number: usize,
}

/// Feedback for a submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub question_id: String,
    pub correct: bool,
    pub correct_option: String,
    pub explanation: Option<String>,
    pub reward: f64,
    /// Tier the policy bootstrapped its update against.
    pub next_difficulty: Difficulty,
    /// Session accuracy including this answer.
    pub running_accuracy: f64,
    pub running_mean_latency_secs: f64,
}

#[derive(Debug, Clone, Copy)]
struct PendingTurn {
    question: usize,
    review: Option<DueEntry>,
}

pub struct AdaptiveSession {
    id: Uuid,
    bank: Arc<QuestionBank>,
    config: EngineConfig,
    policy: DifficultyPolicy,
    selector: QuestionSelector,
    queue: RepetitionQueue,
    tracker: PerformanceTracker,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    current_difficulty: Difficulty,
    asked: Vec<usize>,
    pending: Option<PendingTurn>,
}

impl AdaptiveSession {
    /// Start a session on the system clock.
    pub fn new(bank: Arc<QuestionBank>, config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_clock(bank, config, Arc::new(SystemClock))
    }

    /// Start a session on a custom clock.
    ///
    /// Fails with `BankExhausted` if any tier has no questions.
    pub fn with_clock(
        bank: Arc<QuestionBank>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if let Some(&difficulty) = bank.missing_tiers().first() {
            return Err(EngineError::BankExhausted { difficulty });
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let id = Uuid::new_v4();

        tracing::info!(session = %id, questions = bank.len(), "session started");

        Ok(Self {
            id,
            policy: DifficultyPolicy::from_config(&config),
            selector: QuestionSelector::new(config.recent_window),
            queue: RepetitionQueue::new(config.repetition_offsets()),
            tracker: PerformanceTracker::new(),
            clock,
            rng,
            current_difficulty: Difficulty::Easy,
            asked: Vec::new(),
            pending: None,
            bank,
            config,
        })
    }

    /// Advance to the next question.
    ///
    /// An unanswered previous turn is abandoned first.
    pub fn next_turn(&mut self) -> Result<Turn<'_>, EngineError> {
        if self.pending.is_some() {
            tracing::debug!(session = %self.id, "previous turn abandoned without an answer");
            self.abandon_turn();
        }

        let (question, review) = match self.queue.pop_due(self.clock.now()) {
            Some(entry) => (entry.question, Some(entry)),
            None => {
                let difficulty = if self.tracker.is_empty() {
                    self.current_difficulty
                } else {
                    self.policy
                        .select_next_difficulty(self.current_difficulty, &mut self.rng)
                };
                let pos = self
                    .selector
                    .select(&self.bank, difficulty, &self.asked, &mut self.rng)?;
                (pos, None)
            }
        };

        let Some(q) = self.bank.at(question) else {
            if let Some(entry) = review {
                self.queue.restore(entry);
            }
            return Err(EngineError::BankExhausted {
                difficulty: self.current_difficulty,
            });
        };

        self.asked.push(question);
        self.pending = Some(PendingTurn { question, review });
        tracing::debug!(
            session = %self.id,
            question = %q.id,
            difficulty = %q.difficulty,
            review = review.is_some(),
            "turn started"
        );

        Ok(Turn {
            question: q,
            review: review.is_some(),
            number: self.tracker.history().len() + 1,
        })
    }

    /// Record the learner's answer to the pending question.
    ///
    /// Rejected with `UnknownQuestion`, and without touching any state, if
    /// `question_id` is not the question returned by the last `next_turn`.
    pub fn submit_answer(
        &mut self,
        question_id: &str,
        submitted_option: &str,
        latency_secs: f64,
    ) -> Result<AnswerOutcome, EngineError> {
        let pending = match self.pending {
            Some(p) if self.bank.at(p.question).is_some_and(|q| q.id == question_id) => p,
            other => {
                return Err(EngineError::UnknownQuestion {
                    expected: other
                        .and_then(|p| self.bank.at(p.question))
                        .map(|q| q.id.clone()),
                    submitted: question_id.to_string(),
                })
            }
        };

        let latency_secs = sanitize_latency(latency_secs);
        let bank = Arc::clone(&self.bank);
        let question = bank
            .at(pending.question)
            .ok_or_else(|| EngineError::UnknownQuestion {
                expected: None,
                submitted: question_id.to_string(),
            })?;

        let correct =
            self.tracker
                .record(question, submitted_option, latency_secs, self.clock.wall());
        let step = self
            .policy
            .observe(question.difficulty, correct, latency_secs, &mut self.rng);
        self.current_difficulty = question.difficulty;
        if !correct {
            self.queue.schedule(pending.question, self.clock.now());
        }
        self.pending = None;

        let overall = self.tracker.overall();
        tracing::debug!(
            session = %self.id,
            question = %question.id,
            correct,
            latency_secs,
            reward = step.reward,
            "answer recorded"
        );

        Ok(AnswerOutcome {
            question_id: question.id.clone(),
            correct,
            correct_option: question.correct_option.clone(),
            explanation: question.explanation.clone(),
            reward: step.reward,
            next_difficulty: step.chosen,
            running_accuracy: overall.accuracy(),
            running_mean_latency_secs: overall.mean_latency_secs(),
        })
    }

    /// Drop the pending turn, if any, as though it was never asked.
    ///
    /// A question taken from the repetition queue goes back into it.
    pub fn abandon_turn(&mut self) {
        if let Some(pending) = self.pending.take() {
            if self.asked.last() == Some(&pending.question) {
                self.asked.pop();
            }
            if let Some(entry) = pending.review {
                self.queue.restore(entry);
            }
        }
    }

    /// Report on every attempt completed so far.
    pub fn end_session(&self) -> SessionReport {
        let report = report::generate(&ReportInput {
            session_id: self.id,
            bank: &self.bank,
            tracker: &self.tracker,
            value_table: self.policy.table(),
            pending_reviews: self.queue.len(),
            challenging_count: self.config.challenging_count,
            include_question_details: self.config.include_question_details,
        });
        tracing::info!(
            session = %self.id,
            answered = report.total_questions,
            accuracy = report.overall_accuracy,
            "session report generated"
        );
        report
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub fn policy(&self) -> &DifficultyPolicy {
        &self.policy
    }

    /// Tier of the most recently answered question (Easy before any answer).
    pub fn current_difficulty(&self) -> Difficulty {
        self.current_difficulty
    }

    /// Entries waiting in the repetition queue.
    pub fn pending_reviews(&self) -> usize {
        self.queue.len()
    }

    /// The question awaiting an answer, if any.
    pub fn pending_question(&self) -> Option<&Question> {
        self.pending.and_then(|p| self.bank.at(p.question))
    }
}

fn sanitize_latency(latency_secs: f64) -> f64 {
    if latency_secs.is_finite() && latency_secs >= 0.0 {
        latency_secs
    } else {
        tracing::debug!(latency_secs, "latency out of range, recording 0s");
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::fixtures::{bank, question};
    use std::time::Duration;

    fn config() -> EngineConfig {
        EngineConfig {
            seed: Some(42),
            ..Default::default()
        }
    }

    fn session(clock: Arc<ManualClock>) -> AdaptiveSession {
        AdaptiveSession::with_clock(Arc::new(bank(2)), config(), clock).unwrap()
    }

    #[test]
    fn first_turn_is_easy() {
        let mut s = session(Arc::new(ManualClock::new()));
        let turn = s.next_turn().unwrap();
        assert_eq!(turn.question.difficulty, Difficulty::Easy);
        assert!(!turn.review);
        assert_eq!(turn.number, 1);
    }

    #[test]
    fn rejects_missing_tier() {
        let bank = QuestionBank::new(vec![
            question("e", Difficulty::Easy),
            question("m", Difficulty::Medium),
        ])
        .unwrap();
        let err = AdaptiveSession::new(Arc::new(bank), config()).err().unwrap();
        assert_eq!(
            err,
            EngineError::BankExhausted {
                difficulty: Difficulty::Hard
            }
        );
    }

    #[test]
    fn rejects_invalid_config() {
        let bad = EngineConfig {
            epsilon: -0.5,
            ..Default::default()
        };
        assert!(matches!(
            AdaptiveSession::new(Arc::new(bank(1)), bad),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_offsets_that_overflow_the_clock() {
        let huge = EngineConfig {
            repetition_offsets_minutes: vec![u64::MAX / 60],
            ..config()
        };
        assert!(matches!(
            AdaptiveSession::new(Arc::new(bank(2)), huge),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn failed_turn_leaves_state_untouched() {
        let clock = Arc::new(ManualClock::new());
        let mut s = session(Arc::clone(&clock));
        // A review entry pointing past the end of the bank.
        s.queue.schedule(999, clock.now());
        clock.advance(Duration::from_secs(5 * 60));

        assert!(s.next_turn().is_err());
        assert!(s.asked.is_empty());
        assert!(s.pending_question().is_none());
        assert_eq!(s.pending_reviews(), 3);
    }

    #[test]
    fn wrong_question_id_is_rejected_without_mutation() {
        let mut s = session(Arc::new(ManualClock::new()));
        let id = s.next_turn().unwrap().question.id.clone();

        let err = s.submit_answer("not-pending", "A", 1.0).unwrap_err();
        assert!(matches!(err, EngineError::UnknownQuestion { .. }));
        assert!(s.tracker().is_empty());
        assert_eq!(s.pending_question().map(|q| q.id.clone()), Some(id.clone()));

        assert!(s.submit_answer(&id, "A", 1.0).unwrap().correct);
    }

    #[test]
    fn answer_without_turn_is_rejected() {
        let mut s = session(Arc::new(ManualClock::new()));
        let err = s.submit_answer("easy-0", "A", 1.0).unwrap_err();
        assert_eq!(
            err,
            EngineError::UnknownQuestion {
                expected: None,
                submitted: "easy-0".into()
            }
        );
    }

    #[test]
    fn answering_twice_is_rejected() {
        let mut s = session(Arc::new(ManualClock::new()));
        let id = s.next_turn().unwrap().question.id.clone();
        s.submit_answer(&id, "A", 1.0).unwrap();
        assert!(s.submit_answer(&id, "A", 1.0).is_err());
        assert_eq!(s.tracker().history().len(), 1);
    }

    #[test]
    fn wrong_answer_schedules_reviews() {
        let clock = Arc::new(ManualClock::new());
        let mut s = session(Arc::clone(&clock));
        let id = s.next_turn().unwrap().question.id.clone();
        let outcome = s.submit_answer(&id, "B", 2.0).unwrap();

        assert!(!outcome.correct);
        assert_eq!(outcome.correct_option, "A");
        assert_eq!(s.pending_reviews(), 3);

        clock.advance(Duration::from_secs(5 * 60));
        let turn = s.next_turn().unwrap();
        assert!(turn.review);
        assert_eq!(turn.question.id, id);
        assert_eq!(s.pending_reviews(), 2);
    }

    #[test]
    fn abandoning_a_review_restores_it() {
        let clock = Arc::new(ManualClock::new());
        let mut s = session(Arc::clone(&clock));
        let id = s.next_turn().unwrap().question.id.clone();
        s.submit_answer(&id, "C", 2.0).unwrap();
        clock.advance(Duration::from_secs(5 * 60));

        assert!(s.next_turn().unwrap().review);
        assert_eq!(s.pending_reviews(), 2);
        s.abandon_turn();
        assert_eq!(s.pending_reviews(), 3);
        assert!(s.pending_question().is_none());
        assert_eq!(s.tracker().history().len(), 1);

        // Still due, so it comes straight back.
        assert_eq!(s.next_turn().unwrap().question.id, id);
    }

    #[test]
    fn negative_latency_is_recorded_as_zero() {
        let mut s = session(Arc::new(ManualClock::new()));
        let id = s.next_turn().unwrap().question.id.clone();
        s.submit_answer(&id, "A", -3.0).unwrap();
        assert_eq!(s.tracker().history()[0].latency_secs, 0.0);
    }

    #[test]
    fn end_session_reflects_completed_attempts_only() {
        let mut s = session(Arc::new(ManualClock::new()));
        let id = s.next_turn().unwrap().question.id.clone();
        s.submit_answer(&id, "A", 4.0).unwrap();
        s.next_turn().unwrap();

        let report = s.end_session();
        assert_eq!(report.total_questions, 1);
        assert_eq!(report.overall_accuracy, 1.0);
        assert_eq!(report.session_id, s.id());
        assert_eq!(report, s.end_session());
    }

    #[test]
    fn seeded_sessions_are_reproducible() {
        let run = || {
            let mut s = session(Arc::new(ManualClock::new()));
            let mut ids = Vec::new();
            for i in 0..10 {
                let id = s.next_turn().unwrap().question.id.clone();
                let answer = if i % 3 == 0 { "B" } else { "A" };
                s.submit_answer(&id, answer, 5.0).unwrap();
                ids.push(id);
            }
            ids
        };
        assert_eq!(run(), run());
    }
}
