//! Question bank loader.
//!
//! Reads banks from JSON (an array of question records, or an object with a
//! `questions` array) or TOML (a `[bank]` header plus `[[questions]]` tables),
//! and validates them.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Difficulty, Question, QuestionBank};

/// Question ids appear as numbers or strings in bank files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Int(n) => write!(f, "{n}"),
            RawId::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    id: RawId,
    #[serde(alias = "prompt")]
    question: String,
    #[serde(default)]
    options: BTreeMap<String, String>,
    #[serde(rename = "correctAnswer", alias = "correct_answer", alias = "correct_option")]
    correct_answer: String,
    difficulty: String,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    related_topics: Vec<String>,
    #[serde(default)]
    related_links: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonBankFile {
    List(Vec<RawQuestion>),
    Wrapped {
        #[serde(default)]
        name: Option<String>,
        questions: Vec<RawQuestion>,
    },
}

#[derive(Debug, Deserialize)]
struct TomlBankFile {
    #[serde(default)]
    bank: Option<TomlBankHeader>,
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    name: String,
}

/// Questions read from one bank file.
#[derive(Debug, Clone)]
pub struct BankFile {
    /// Bank name from the file header, or the file stem.
    pub name: String,
    pub source: PathBuf,
    pub questions: Vec<Question>,
}

/// Parse a single bank file.
pub fn parse_bank_file(path: &Path) -> Result<BankFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse bank content; the format follows the extension of `source_path`
/// (`.toml` for TOML, JSON otherwise).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<BankFile> {
    let stem = source_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bank".to_string());

    let (name, raw) = if source_path.extension().is_some_and(|ext| ext == "toml") {
        let parsed: TomlBankFile = toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
        (parsed.bank.map(|h| h.name), parsed.questions)
    } else {
        let parsed: JsonBankFile = serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;
        match parsed {
            JsonBankFile::List(questions) => (None, questions),
            JsonBankFile::Wrapped { name, questions } => (name, questions),
        }
    };

    let questions = raw
        .into_iter()
        .map(|q| {
            let id = q.id.to_string();
            let difficulty: Difficulty = q
                .difficulty
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {id}: {e}"))?;
            Ok(Question {
                id,
                difficulty,
                prompt: q.question,
                options: q.options,
                correct_option: q.correct_answer,
                explanation: q.explanation,
                related_topics: q.related_topics,
                related_links: q.related_links,
            })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid question in {}", source_path.display()))?;

    Ok(BankFile {
        name: name.unwrap_or(stem),
        source: source_path.to_path_buf(),
        questions,
    })
}

/// Load all bank files from a directory, recursively.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<BankFile>> {
    let mut banks = Vec::new();

    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_bank_file(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load bank files from a file or directory.
pub fn load_bank_files(path: &Path) -> Result<Vec<BankFile>> {
    if path.is_dir() {
        load_bank_directory(path)
    } else {
        Ok(vec![parse_bank_file(path)?])
    }
}

/// Load a file or directory and merge everything into one bank.
pub fn load_bank(path: &Path) -> Result<QuestionBank> {
    let questions: Vec<Question> = load_bank_files(path)?
        .into_iter()
        .flat_map(|file| file.questions)
        .collect();
    anyhow::ensure!(
        !questions.is_empty(),
        "no questions found in {}",
        path.display()
    );
    QuestionBank::new(questions).with_context(|| format!("invalid bank: {}", path.display()))
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate bank contents for common issues.
pub fn validate_bank(questions: &[Question]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for q in questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for difficulty in Difficulty::ALL {
        if !questions.iter().any(|q| q.difficulty == difficulty) {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!("no {difficulty} questions; sessions cannot start"),
            });
        }
    }

    for q in questions {
        if q.prompt.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "prompt is empty".into(),
            });
        }
        if q.options.len() < 2 {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!("only {} option(s); expected at least 2", q.options.len()),
            });
        }
        if !q.options.keys().any(|label| q.is_correct(label)) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!(
                    "correct answer '{}' is not one of the options",
                    q.correct_option
                ),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_JSON: &str = r#"[
  {
    "id": 1,
    "question": "What does CPU stand for?",
    "options": {"A": "Central Processing Unit", "B": "Core Power Unit", "C": "Central Power Unit", "D": "Compute Path Unit"},
    "correctAnswer": "A",
    "explanation": "CPU is the Central Processing Unit.",
    "difficulty": "Easy",
    "related_topics": ["hardware"],
    "related_links": []
  },
  {
    "id": "net-1",
    "question": "Which layer does TCP live on?",
    "options": {"A": "Network", "B": "Transport"},
    "correctAnswer": "B",
    "difficulty": "medium"
  }
]"#;

    const VALID_TOML: &str = r#"
[bank]
name = "Networking"
description = "Basics"

[[questions]]
id = "dns"
prompt = "What does DNS resolve?"
correct_answer = "A"
difficulty = "Hard"

[questions.options]
A = "Names to addresses"
B = "Addresses to MACs"
"#;

    #[test]
    fn parse_generator_json() {
        let bank = parse_bank_str(VALID_JSON, &PathBuf::from("sample.json")).unwrap();
        assert_eq!(bank.name, "sample");
        assert_eq!(bank.questions.len(), 2);
        assert_eq!(bank.questions[0].id, "1");
        assert_eq!(bank.questions[0].difficulty, Difficulty::Easy);
        assert_eq!(bank.questions[0].related_topics, vec!["hardware"]);
        assert_eq!(bank.questions[1].id, "net-1");
        assert_eq!(bank.questions[1].difficulty, Difficulty::Medium);
        assert!(bank.questions[1].explanation.is_none());
    }

    #[test]
    fn parse_wrapped_json() {
        let json = r#"{"name": "Wrapped", "questions": [
            {"id": 3, "question": "Q?", "options": {"A": "x", "B": "y"}, "correctAnswer": "A", "difficulty": "Hard"}
        ]}"#;
        let bank = parse_bank_str(json, &PathBuf::from("w.json")).unwrap();
        assert_eq!(bank.name, "Wrapped");
        assert_eq!(bank.questions[0].difficulty, Difficulty::Hard);
    }

    #[test]
    fn parse_toml_bank() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("net.toml")).unwrap();
        assert_eq!(bank.name, "Networking");
        assert_eq!(bank.questions.len(), 1);
        assert_eq!(bank.questions[0].prompt, "What does DNS resolve?");
        assert_eq!(bank.questions[0].correct_option, "A");
        assert_eq!(bank.questions[0].options.len(), 2);
    }

    #[test]
    fn unknown_difficulty_is_an_error() {
        let json = r#"[{"id": 1, "question": "Q", "options": {}, "correctAnswer": "A", "difficulty": "Expert"}]"#;
        let err = parse_bank_str(json, &PathBuf::from("bad.json")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown difficulty"));
    }

    #[test]
    fn parse_malformed_json() {
        let result = parse_bank_str("[{not json", &PathBuf::from("bad.json"));
        assert!(result.is_err());
    }

    #[test]
    fn validate_reports_problems() {
        let mut questions = parse_bank_str(VALID_JSON, &PathBuf::from("sample.json"))
            .unwrap()
            .questions;
        questions.push(questions[0].clone());
        questions[1].correct_option = "Z".into();

        let warnings = validate_bank(&questions);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message.contains("no Hard questions")));
        assert!(warnings
            .iter()
            .any(|w| w.question_id.as_deref() == Some("net-1")
                && w.message.contains("not one of the options")));
    }

    #[test]
    fn load_directory_merges_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), VALID_JSON).unwrap();
        std::fs::write(dir.path().join("b.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = load_bank_directory(dir.path()).unwrap();
        assert_eq!(files.len(), 2);

        let bank = load_bank(dir.path()).unwrap();
        assert_eq!(bank.len(), 3);
        assert!(bank.missing_tiers().is_empty());
    }

    #[test]
    fn load_bank_rejects_duplicate_ids_across_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), VALID_JSON).unwrap();
        std::fs::write(dir.path().join("b.json"), VALID_JSON).unwrap();
        assert!(load_bank(dir.path()).is_err());
    }
}
