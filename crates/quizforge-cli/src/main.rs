//! quizforge CLI: adaptive quiz sessions in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizforge", version, about = "Adaptive multiple-choice quiz engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive quiz session
    Run {
        /// Path to a question bank file (.json or .toml) or directory
        #[arg(long)]
        bank: PathBuf,

        /// Number of questions to ask (default: session_length from config)
        #[arg(long)]
        questions: Option<usize>,

        /// Seed for reproducible question selection
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory (default: output_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, markdown, all (comma-separated)
        #[arg(long)]
        format: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question bank files
    Validate {
        /// Path to a question bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Render a saved session report
    Report {
        /// Session report JSON
        #[arg(long)]
        input: PathBuf,

        /// Output format: text, markdown, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizforge=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            bank,
            questions,
            seed,
            output,
            format,
            config,
        } => commands::run::execute(bank, questions, seed, output, format, config).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Report {
            input,
            format,
            output,
        } => commands::report::execute(input, format, output),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
