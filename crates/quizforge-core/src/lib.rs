//! quizforge-core: adaptive question selection, spaced repetition, and
//! session reporting.
//!
//! An [`AdaptiveSession`] serves one learner: it picks each question from a
//! shared [`QuestionBank`], records answers, learns which difficulty to ask
//! next, and re-presents missed questions on a schedule.

pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod model;
pub mod parser;
pub mod policy;
pub mod repetition;
pub mod report;
pub mod selector;
pub mod session;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, QuizforgeConfig};
pub use driver::{run_session, AnswerSource, EndReason, NoopReporter, ProgressReporter, SubmittedAnswer};
pub use error::EngineError;
pub use model::{Difficulty, Question, QuestionBank};
pub use report::SessionReport;
pub use session::{AdaptiveSession, AnswerOutcome, Turn};
