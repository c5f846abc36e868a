//! The `quizforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::model::Question;
use quizforge_core::parser;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let files = parser::load_bank_files(&bank_path)?;
    anyhow::ensure!(
        !files.is_empty(),
        "no question banks found in {}",
        bank_path.display()
    );

    for file in &files {
        println!(
            "Bank: {} ({} questions) from {}",
            file.name,
            file.questions.len(),
            file.source.display()
        );
    }

    let questions: Vec<Question> = files.into_iter().flat_map(|f| f.questions).collect();
    let warnings = parser::validate_bank(&questions);
    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("All question banks valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
