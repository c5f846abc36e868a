//! Async session driver.
//!
//! Hosts that collect answers asynchronously implement [`AnswerSource`] and
//! hand it to [`run_session`]. All session mutation happens between awaits, so
//! dropping the driver future mid-turn leaves the session consistent: the
//! host then calls [`AdaptiveSession::abandon_turn`] and
//! [`AdaptiveSession::end_session`].

use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::Question;
use crate::report::SessionReport;
use crate::session::{AdaptiveSession, AnswerOutcome, Turn};

/// An answer collected from the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub option: String,
    pub latency_secs: f64,
}

/// Where answers come from (a terminal, a socket, a test script).
#[async_trait]
pub trait AnswerSource: Send {
    /// Wait for the learner's answer to `question`.
    ///
    /// `Ok(None)` means the learner disconnected.
    async fn answer(&mut self, question: &Question) -> Result<Option<SubmittedAnswer>>;
}

/// Progress callback for session events.
pub trait ProgressReporter: Send + Sync {
    fn on_question(&self, turn: &Turn<'_>);
    fn on_answer(&self, question: &Question, outcome: &AnswerOutcome);
    fn on_session_complete(&self, report: &SessionReport, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_question(&self, _: &Turn<'_>) {}
    fn on_answer(&self, _: &Question, _: &AnswerOutcome) {}
    fn on_session_complete(&self, _: &SessionReport, _: Duration) {}
}

/// Why a driven session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The requested number of questions was answered.
    Completed,
    /// The answer source reported the learner gone.
    Disconnected,
}

/// Result of [`run_session`].
#[derive(Debug, Clone)]
pub struct SessionRun {
    pub report: SessionReport,
    pub end: EndReason,
    pub elapsed: Duration,
}

/// Drive `session` for up to `max_turns` answered questions.
///
/// A disconnect or source error abandons the pending turn. Engine errors are
/// returned as-is; a rejected answer never reaches the engine from here since
/// the driver always submits for the question it just received.
pub async fn run_session<S>(
    session: &mut AdaptiveSession,
    source: &mut S,
    max_turns: usize,
    progress: &dyn ProgressReporter,
) -> Result<SessionRun>
where
    S: AnswerSource + ?Sized,
{
    let start = Instant::now();
    let mut answered = 0;
    let mut end = EndReason::Completed;

    while answered < max_turns {
        let question = {
            let turn = session.next_turn()?;
            progress.on_question(&turn);
            turn.question.clone()
        };

        let answer = match source.answer(&question).await {
            Ok(answer) => answer,
            Err(e) => {
                session.abandon_turn();
                return Err(e.context(format!("failed to collect answer for {}", question.id)));
            }
        };

        let Some(answer) = answer else {
            tracing::info!(session = %session.id(), answered, "learner disconnected");
            session.abandon_turn();
            end = EndReason::Disconnected;
            break;
        };

        let outcome = session.submit_answer(&question.id, &answer.option, answer.latency_secs)?;
        progress.on_answer(&question, &outcome);
        answered += 1;
    }

    let report = session.end_session();
    let elapsed = start.elapsed();
    progress.on_session_complete(&report, elapsed);

    Ok(SessionRun {
        report,
        end,
        elapsed,
    })
}
