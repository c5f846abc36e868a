//! Session report generation with JSON persistence and markdown rendering.
//!
//! Reports are a pure function of recorded state: generating twice without
//! new attempts yields identical values and identical serialized bytes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Difficulty, Question, QuestionBank};
use crate::policy::ValueTable;
use crate::tracker::{PerformanceStats, PerformanceTracker, WrongAnswer};

/// Summary of one learner session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub total_questions: usize,
    pub total_correct: usize,
    pub total_wrong: usize,
    /// `total_correct / total_questions`, or 0 with no attempts.
    pub overall_accuracy: f64,
    pub average_latency_secs: f64,
    /// Only tiers that were actually attempted.
    pub difficulty_performance: BTreeMap<Difficulty, TierPerformance>,
    /// Lowest accuracy first, faster first on ties.
    pub challenging_questions: Vec<QuestionPerformance>,
    pub wrong_answers: Vec<WrongAnswer>,
    /// Every bank question with the learner's record on it.
    #[serde(default)]
    pub question_details: Vec<QuestionPerformance>,
    /// Repetition entries still waiting when the report was made.
    pub pending_reviews: usize,
    /// Value table snapshot.
    pub learning_progress: ValueTable,
}

/// Accuracy and timing for one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPerformance {
    pub total_questions: u32,
    pub accuracy: f64,
    pub average_latency_secs: f64,
}

/// Static question metadata joined with the learner's aggregate on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPerformance {
    pub id: String,
    pub prompt: String,
    pub options: BTreeMap<String, String>,
    pub correct_option: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub related_topics: Vec<String>,
    #[serde(default)]
    pub related_links: Vec<String>,
    pub attempts: u32,
    pub correct_attempts: u32,
    pub accuracy: f64,
    pub average_latency_secs: f64,
}

impl QuestionPerformance {
    fn new(question: &Question, stats: PerformanceStats) -> Self {
        Self {
            id: question.id.clone(),
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            correct_option: question.correct_option.clone(),
            difficulty: question.difficulty,
            explanation: question.explanation.clone(),
            related_topics: question.related_topics.clone(),
            related_links: question.related_links.clone(),
            attempts: stats.attempts,
            correct_attempts: stats.correct,
            accuracy: stats.accuracy(),
            average_latency_secs: stats.mean_latency_secs(),
        }
    }
}

/// Everything [`generate`] reads.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub session_id: Uuid,
    pub bank: &'a QuestionBank,
    pub tracker: &'a PerformanceTracker,
    pub value_table: &'a ValueTable,
    pub pending_reviews: usize,
    pub challenging_count: usize,
    pub include_question_details: bool,
}

/// Build a report from recorded session state.
pub fn generate(input: &ReportInput<'_>) -> SessionReport {
    let tracker = input.tracker;
    let overall = tracker.overall();

    let difficulty_performance = Difficulty::ALL
        .into_iter()
        .filter_map(|d| {
            tracker.difficulty_stats(d).map(|stats| {
                (
                    d,
                    TierPerformance {
                        total_questions: stats.attempts,
                        accuracy: stats.accuracy(),
                        average_latency_secs: stats.mean_latency_secs(),
                    },
                )
            })
        })
        .collect();

    let challenging_questions =
        most_challenging(input.bank, tracker.per_question(), input.challenging_count);

    let question_details = if input.include_question_details {
        input
            .bank
            .questions()
            .iter()
            .map(|q| {
                let stats = tracker.question_stats(&q.id).copied().unwrap_or_default();
                QuestionPerformance::new(q, stats)
            })
            .collect()
    } else {
        Vec::new()
    };

    SessionReport {
        session_id: input.session_id,
        total_questions: overall.attempts as usize,
        total_correct: overall.correct as usize,
        total_wrong: overall.wrong() as usize,
        overall_accuracy: overall.accuracy(),
        average_latency_secs: overall.mean_latency_secs(),
        difficulty_performance,
        challenging_questions,
        wrong_answers: tracker.wrong_answers().to_vec(),
        question_details,
        pending_reviews: input.pending_reviews,
        learning_progress: *input.value_table,
    }
}

/// Rank attempted questions by ascending accuracy, then ascending mean
/// latency, then bank order, and keep the first `count`.
pub fn most_challenging(
    bank: &QuestionBank,
    per_question: &HashMap<String, PerformanceStats>,
    count: usize,
) -> Vec<QuestionPerformance> {
    let mut ranked: Vec<(usize, &Question, PerformanceStats)> = bank
        .questions()
        .iter()
        .enumerate()
        .filter_map(|(pos, q)| {
            per_question
                .get(&q.id)
                .filter(|stats| stats.attempts > 0)
                .map(|stats| (pos, q, *stats))
        })
        .collect();

    ranked.sort_by(|(pos_a, _, a), (pos_b, _, b)| {
        a.accuracy()
            .total_cmp(&b.accuracy())
            .then_with(|| a.mean_latency_secs().total_cmp(&b.mean_latency_secs()))
            .then_with(|| pos_a.cmp(pos_b))
    });

    ranked
        .into_iter()
        .take(count)
        .map(|(_, q, stats)| QuestionPerformance::new(q, stats))
        .collect()
}

impl SessionReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("## Session Report\n\n");
        md.push_str(&format!(
            "**Summary:** {} answered, {} correct, {} wrong ({:.1}% accuracy, {:.1}s average)\n\n",
            self.total_questions,
            self.total_correct,
            self.total_wrong,
            self.overall_accuracy * 100.0,
            self.average_latency_secs
        ));

        if !self.difficulty_performance.is_empty() {
            md.push_str("### By Difficulty\n\n");
            md.push_str("| Difficulty | Questions | Accuracy | Avg Time |\n");
            md.push_str("|------------|-----------|----------|----------|\n");
            for (difficulty, perf) in &self.difficulty_performance {
                md.push_str(&format!(
                    "| {} | {} | {:.1}% | {:.1}s |\n",
                    difficulty,
                    perf.total_questions,
                    perf.accuracy * 100.0,
                    perf.average_latency_secs
                ));
            }
            md.push('\n');
        }

        if !self.challenging_questions.is_empty() {
            md.push_str("### Most Challenging\n\n");
            md.push_str("| Question | Difficulty | Attempts | Accuracy | Avg Time |\n");
            md.push_str("|----------|------------|----------|----------|----------|\n");
            for q in &self.challenging_questions {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.1}% | {:.1}s |\n",
                    q.id,
                    q.difficulty,
                    q.attempts,
                    q.accuracy * 100.0,
                    q.average_latency_secs
                ));
            }
            md.push('\n');
        }

        if !self.wrong_answers.is_empty() {
            md.push_str("### Wrong Answers\n\n");
            for w in &self.wrong_answers {
                md.push_str(&format!(
                    "- **{}** ({}): answered {}, correct {}",
                    w.question_id, w.difficulty, w.submitted_option, w.correct_option
                ));
                if let Some(explanation) = &w.explanation {
                    md.push_str(&format!(": {explanation}"));
                }
                md.push('\n');
            }
            md.push('\n');
        }

        if self.pending_reviews > 0 {
            md.push_str(&format!(
                "{} question review(s) still scheduled.\n",
                self.pending_reviews
            ));
        }

        md
    }
}
