//! The `quizforge report` command.

use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::report::SessionReport;
use quizforge_report::html::generate_html;

pub fn execute(input: PathBuf, format: String, output: Option<PathBuf>) -> Result<()> {
    let report = SessionReport::load_json(&input)?;

    let rendered = match format.as_str() {
        "markdown" | "md" => report.to_markdown(),
        "html" => generate_html(&report),
        "json" => serde_json::to_string_pretty(&report)?,
        "text" => to_text(&report),
        other => anyhow::bail!("unknown format '{other}' (expected text, markdown, html, json)"),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, rendered)?;
            eprintln!("Report written to: {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn to_text(report: &SessionReport) -> String {
    let mut out = format!(
        "Session {}: {} answered, {} correct, {} wrong ({:.1}% accuracy, {:.1}s average)\n",
        report.session_id,
        report.total_questions,
        report.total_correct,
        report.total_wrong,
        report.overall_accuracy * 100.0,
        report.average_latency_secs
    );

    if !report.difficulty_performance.is_empty() {
        out.push_str("\nBy difficulty:\n");
        for (tier, perf) in &report.difficulty_performance {
            out.push_str(&format!(
                "  {tier}: {} question(s), {:.1}%, {:.1}s\n",
                perf.total_questions,
                perf.accuracy * 100.0,
                perf.average_latency_secs
            ));
        }
    }

    if !report.challenging_questions.is_empty() {
        out.push_str("\nMost challenging:\n");
        for q in &report.challenging_questions {
            out.push_str(&format!(
                "  {} [{}] {:.1}% over {} attempt(s)\n",
                q.id,
                q.difficulty,
                q.accuracy * 100.0,
                q.attempts
            ));
        }
    }

    if !report.wrong_answers.is_empty() {
        out.push_str("\nWrong answers:\n");
        for w in &report.wrong_answers {
            out.push_str(&format!(
                "  {}: answered {}, correct {}\n",
                w.question_id, w.submitted_option, w.correct_option
            ));
        }
    }

    out
}
