//! The `quizforge run` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use quizforge_core::config::load_config_from;
use quizforge_core::driver::{run_session, AnswerSource, EndReason, ProgressReporter, SubmittedAnswer};
use quizforge_core::model::Question;
use quizforge_core::parser;
use quizforge_core::report::SessionReport;
use quizforge_core::session::{AdaptiveSession, AnswerOutcome, Turn};
use quizforge_report::html::write_html_report;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_question(&self, turn: &Turn<'_>) {
        let q = turn.question;
        let review = if turn.review { " (review)" } else { "" };
        println!("\nQuestion {} [{}]{}", turn.number, q.difficulty, review);
        println!("{}", q.prompt);
        for (label, text) in &q.options {
            println!("  {label}) {text}");
        }
        print!("Your answer: ");
        let _ = std::io::stdout().flush();
    }

    fn on_answer(&self, _question: &Question, outcome: &AnswerOutcome) {
        if outcome.correct {
            println!("Correct!");
        } else {
            println!("Wrong. The correct answer was {}.", outcome.correct_option);
        }
        if let Some(explanation) = &outcome.explanation {
            println!("  {explanation}");
        }
        println!(
            "  Accuracy so far: {:.1}%",
            outcome.running_accuracy * 100.0
        );
    }

    fn on_session_complete(&self, report: &SessionReport, elapsed: Duration) {
        eprintln!(
            "\nComplete: {}/{} correct ({:.1}s)",
            report.total_correct,
            report.total_questions,
            elapsed.as_secs_f64()
        );
    }
}

/// Answers typed on stdin, one per line.
///
/// Lines are read on a plain thread so a pending read never holds up
/// runtime shutdown.
struct StdinSource {
    lines: mpsc::Receiver<String>,
}

impl StdinSource {
    fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(16);
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });
        Self { lines: rx }
    }
}

#[async_trait]
impl AnswerSource for StdinSource {
    async fn answer(&mut self, _question: &Question) -> Result<Option<SubmittedAnswer>> {
        let asked_at = Instant::now();
        loop {
            let Some(line) = self.lines.recv().await else {
                return Ok(None);
            };
            let option = line.trim();
            if option.is_empty() {
                continue;
            }
            if option.eq_ignore_ascii_case("quit") {
                return Ok(None);
            }
            return Ok(Some(SubmittedAnswer {
                option: option.to_string(),
                latency_secs: asked_at.elapsed().as_secs_f64(),
            }));
        }
    }
}

pub async fn execute(
    bank_path: PathBuf,
    questions: Option<usize>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    format: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    // Load config, then let flags win
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(n) = questions {
        config.session_length = n;
    }
    if seed.is_some() {
        config.engine.seed = seed;
    }
    if let Some(dir) = output {
        config.output_dir = dir;
    }
    if let Some(f) = format {
        config.report_formats = f.split(',').map(|s| s.trim().to_string()).collect();
    }
    anyhow::ensure!(config.session_length >= 1, "questions must be at least 1");

    // Load bank
    let bank = parser::load_bank(&bank_path)?;
    for w in parser::validate_bank(bank.questions()) {
        match &w.question_id {
            Some(id) => tracing::warn!("[{id}] {}", w.message),
            None => tracing::warn!("{}", w.message),
        }
    }

    let mut session = AdaptiveSession::new(Arc::new(bank), config.engine.clone())?;
    let mut source = StdinSource::spawn();
    let reporter = ConsoleReporter;

    eprintln!(
        "quizforge v{}: {} questions from a bank of {} (type 'quit' or press Ctrl-C to stop)",
        env!("CARGO_PKG_VERSION"),
        config.session_length,
        session.bank().len()
    );

    let finished = tokio::select! {
        run = run_session(&mut session, &mut source, config.session_length, &reporter) => Some(run?),
        _ = tokio::signal::ctrl_c() => None,
    };

    let report = match finished {
        Some(run) => {
            if run.end == EndReason::Disconnected {
                eprintln!("\nSession ended early.");
            }
            run.report
        }
        None => {
            eprintln!("\nInterrupted, ending session early.");
            session.abandon_turn();
            session.end_session()
        }
    };

    print_summary(&report);
    write_outputs(&report, &config.output_dir, &config.report_formats)?;

    Ok(())
}

fn write_outputs(report: &SessionReport, output: &std::path::Path, formats: &[String]) -> Result<()> {
    std::fs::create_dir_all(output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if formats.iter().any(|f| f == "all") {
        vec!["json", "html", "markdown"]
    } else {
        formats.iter().map(String::as_str).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("session-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("session-{timestamp}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("session-{timestamp}.md"));
                std::fs::write(&path, report.to_markdown())?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn print_summary(report: &SessionReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Tier", "Questions", "Accuracy", "Avg Time"]);

    for (tier, perf) in &report.difficulty_performance {
        table.add_row(vec![
            Cell::new(tier),
            Cell::new(perf.total_questions),
            Cell::new(format!("{:.1}%", perf.accuracy * 100.0)),
            Cell::new(format!("{:.1}s", perf.average_latency_secs)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Overall"),
        Cell::new(report.total_questions),
        Cell::new(format!("{:.1}%", report.overall_accuracy * 100.0)),
        Cell::new(format!("{:.1}s", report.average_latency_secs)),
    ]);

    eprintln!("\n{table}");

    if !report.challenging_questions.is_empty() {
        eprintln!("Most challenging:");
        for q in &report.challenging_questions {
            eprintln!(
                "  {} [{}] {:.1}% over {} attempt(s)",
                q.id,
                q.difficulty,
                q.accuracy * 100.0,
                q.attempts
            );
        }
    }
    if report.pending_reviews > 0 {
        eprintln!("{} review(s) were still pending.", report.pending_reviews);
    }
}
