//! Engine error types.
//!
//! These are the failures a host can observe from a session. Loading and
//! parsing helpers return `anyhow::Result` instead; only the session contract
//! uses this typed taxonomy so hosts can map kinds to their own messaging.

use thiserror::Error;

use crate::model::Difficulty;

/// Errors surfaced by the adaptive session engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The bank has no question for a tier the policy can choose.
    #[error("question bank has no {difficulty} questions")]
    BankExhausted { difficulty: Difficulty },

    /// An answer was submitted for a question that is not currently pending.
    #[error("answer submitted for question '{submitted}' but pending question is {}", expected.as_deref().unwrap_or("none"))]
    UnknownQuestion {
        expected: Option<String>,
        submitted: String,
    },

    /// The engine configuration was rejected at construction time.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Returns `true` if the session cannot continue after this error.
    ///
    /// A rejected answer leaves state untouched and the session usable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::UnknownQuestion { .. })
    }
}
