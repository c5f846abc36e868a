//! Engine and file-level configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Longest accepted repetition offset: one year.
pub const MAX_REPETITION_OFFSET_MINUTES: u64 = 365 * 24 * 60;

/// Tuning knobs for one adaptive session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Probability of picking a uniformly random tier.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// TD learning rate (alpha).
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// TD discount factor (gamma).
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f64,
    /// Minutes after a wrong answer at which the question comes back.
    #[serde(default = "default_repetition_offsets")]
    pub repetition_offsets_minutes: Vec<u64>,
    /// How many recently asked questions are excluded from selection.
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    /// Number of entries in the "most challenging" ranking.
    #[serde(default = "default_challenging_count")]
    pub challenging_count: usize,
    /// Fixed RNG seed for reproducible sessions.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Include the per-question detail table in reports.
    #[serde(default = "default_true")]
    pub include_question_details: bool,
}

fn default_epsilon() -> f64 {
    0.1
}
fn default_learning_rate() -> f64 {
    0.1
}
fn default_discount_factor() -> f64 {
    0.9
}
fn default_repetition_offsets() -> Vec<u64> {
    vec![5, 25, 120]
}
fn default_recent_window() -> usize {
    5
}
fn default_challenging_count() -> usize {
    3
}
fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            learning_rate: default_learning_rate(),
            discount_factor: default_discount_factor(),
            repetition_offsets_minutes: default_repetition_offsets(),
            recent_window: default_recent_window(),
            challenging_count: default_challenging_count(),
            seed: None,
            include_question_details: true,
        }
    }
}

impl EngineConfig {
    /// Check value ranges. Called by the session constructor.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: String| Err(EngineError::InvalidConfig(msg));

        if !(0.0..=1.0).contains(&self.epsilon) {
            return invalid(format!("epsilon must be within [0, 1], got {}", self.epsilon));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return invalid(format!(
                "learning_rate must be within (0, 1], got {}",
                self.learning_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return invalid(format!(
                "discount_factor must be within [0, 1], got {}",
                self.discount_factor
            ));
        }
        if self.repetition_offsets_minutes.is_empty() {
            return invalid("repetition_offsets_minutes must not be empty".into());
        }
        if self.repetition_offsets_minutes.contains(&0) {
            return invalid("repetition offsets must be at least one minute".into());
        }
        if let Some(&m) = self
            .repetition_offsets_minutes
            .iter()
            .find(|&&m| m > MAX_REPETITION_OFFSET_MINUTES)
        {
            return invalid(format!(
                "repetition offset of {m} minutes exceeds the maximum of {MAX_REPETITION_OFFSET_MINUTES}"
            ));
        }
        Ok(())
    }

    /// Repetition offsets as durations, in configured order.
    pub fn repetition_offsets(&self) -> Vec<Duration> {
        self.repetition_offsets_minutes
            .iter()
            .map(|&m| Duration::from_secs(m.saturating_mul(60)))
            .collect()
    }
}

/// Top-level quizforge configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizforgeConfig {
    /// Engine tuning.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Questions asked per session.
    #[serde(default = "default_session_length")]
    pub session_length: usize,
    /// Where reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Report formats written at the end of a session.
    #[serde(default = "default_report_formats")]
    pub report_formats: Vec<String>,
}

fn default_session_length() -> usize {
    15
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizforge-results")
}
fn default_report_formats() -> Vec<String> {
    vec!["json".to_string()]
}

impl Default for QuizforgeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            session_length: default_session_length(),
            output_dir: default_output_dir(),
            report_formats: default_report_formats(),
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizforge.toml` in the current directory
/// 2. `~/.config/quizforge/config.toml`
///
/// Environment variable overrides: `QUIZFORGE_SEED`, `QUIZFORGE_EPSILON`.
pub fn load_config() -> Result<QuizforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizforge.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizforgeConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.engine.validate()?;

    Ok(config)
}

/// Parse a TOML configuration string.
pub fn parse_config_str(content: &str) -> Result<QuizforgeConfig> {
    Ok(toml::from_str::<QuizforgeConfig>(content)?)
}

fn apply_env_overrides(config: &mut QuizforgeConfig) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply `QUIZFORGE_*` overrides looked up through `var`.
fn apply_overrides(
    config: &mut QuizforgeConfig,
    var: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(seed) = var("QUIZFORGE_SEED") {
        config.engine.seed = Some(
            seed.trim()
                .parse()
                .with_context(|| format!("QUIZFORGE_SEED is not an integer: '{seed}'"))?,
        );
    }
    if let Some(epsilon) = var("QUIZFORGE_EPSILON") {
        config.engine.epsilon = epsilon
            .trim()
            .parse()
            .with_context(|| format!("QUIZFORGE_EPSILON is not a number: '{epsilon}'"))?;
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizforge"))
}
