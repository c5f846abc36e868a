//! Core data model types for quizforge.
//!
//! Questions are immutable once loaded and owned by a [`QuestionBank`]; every
//! other component refers to them by id or bank position.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Difficulty tier of a question.
///
/// The declaration order (Easy < Medium < Hard) is the tie-break order used
/// by the difficulty policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Every tier, in enumeration order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Position of this tier in [`Difficulty::ALL`].
    pub fn index(self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    /// Reward multiplier for answering at this tier.
    pub fn reward_multiplier(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.5,
            Difficulty::Hard => 2.0,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier, unique within a bank.
    pub id: String,
    /// Difficulty tier. Never changes after load.
    pub difficulty: Difficulty,
    /// The question text shown to the learner.
    pub prompt: String,
    /// Option label (e.g. "A") to option text.
    pub options: BTreeMap<String, String>,
    /// Label of the correct option.
    pub correct_option: String,
    /// Why the correct option is correct.
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub related_topics: Vec<String>,
    #[serde(default)]
    pub related_links: Vec<String>,
}

impl Question {
    /// Case-insensitive comparison of a submitted label against the correct one.
    pub fn is_correct(&self, submitted: &str) -> bool {
        submitted.to_uppercase() == self.correct_option.to_uppercase()
    }
}

/// The fixed pool of questions for a session.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
    positions: HashMap<String, usize>,
}

impl QuestionBank {
    /// Build a bank, rejecting duplicate question ids.
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(questions.len());
        for (pos, question) in questions.iter().enumerate() {
            if positions.insert(question.id.clone(), pos).is_some() {
                anyhow::bail!("duplicate question id: {}", question.id);
            }
        }
        Ok(Self {
            questions,
            positions,
        })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions in load order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Look up a question by id.
    pub fn get(&self, id: &str) -> Option<&Question> {
        self.position(id).map(|pos| &self.questions[pos])
    }

    /// Bank position of a question id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Question at a bank position.
    pub fn at(&self, position: usize) -> Option<&Question> {
        self.questions.get(position)
    }

    /// Positions of every question in a tier, in load order.
    pub fn positions_for(&self, difficulty: Difficulty) -> Vec<usize> {
        self.questions
            .iter()
            .enumerate()
            .filter(|(_, q)| q.difficulty == difficulty)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Number of questions in a tier.
    pub fn count(&self, difficulty: Difficulty) -> usize {
        self.questions
            .iter()
            .filter(|q| q.difficulty == difficulty)
            .count()
    }

    /// Tiers that have no questions at all.
    pub fn missing_tiers(&self) -> Vec<Difficulty> {
        Difficulty::ALL
            .into_iter()
            .filter(|&d| self.count(d) == 0)
            .collect()
    }
}
