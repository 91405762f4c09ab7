//! Command-line surface.

mod repl;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use novacalc::calculator::ERROR_MARKER;
use novacalc::config::Config;
use novacalc::explain::{
    DisabledExplainer, ExplainError, Explainer, Explanation, GeminiClient, GeminiConfig,
    explain_or_fallback,
};
use novacalc::history::{FileStorage, HistoryEntry, HistoryStore};
use novacalc::session::{Calculator, Outcome};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "novacalc", version, about = "Keypad calculator with history and AI explanations")]
pub struct Cli {
    /// Path to config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the history file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate an expression and record it in history
    Eval { expression: String },
    /// List past calculations, most recent first
    History {
        #[command(subcommand)]
        action: Option<HistoryCommand>,
    },
    /// Show a past calculation by id
    Replay { id: String },
    /// Evaluate an expression and explain the result
    Explain { expression: String },
    /// Interactive session (default)
    Repl,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// Delete all history
    Clear,
}

/// The explanation service selected by config.
pub enum Backend {
    Gemini(GeminiClient),
    Disabled(DisabledExplainer),
}

impl Backend {
    fn from_config(config: &Config) -> Result<Self> {
        if !config.explain.enabled {
            return Ok(Self::Disabled(DisabledExplainer));
        }
        let client = GeminiClient::new(GeminiConfig::from_settings(&config.explain))
            .context("Failed to create Gemini client")?;
        Ok(Self::Gemini(client))
    }
}

impl Explainer for Backend {
    async fn explain(&self, expression: &str, result: &str) -> Result<Explanation, ExplainError> {
        match self {
            Self::Gemini(client) => client.explain(expression, result).await,
            Self::Disabled(disabled) => disabled.explain(expression, result).await,
        }
    }
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.data_dir())
        .context("Could not determine a data directory. Pass --data-dir.")?;
    debug!(data_dir = %data_dir.display(), "Using history storage");

    let history = HistoryStore::load(FileStorage::new(data_dir));
    let mut calc = Calculator::new(history);

    match cli.command.unwrap_or(Command::Repl) {
        Command::Eval { expression } => Ok(eval_once(&mut calc, &expression)),
        Command::History { action: None } => {
            print_history(calc.history().entries());
            Ok(ExitCode::SUCCESS)
        }
        Command::History {
            action: Some(HistoryCommand::Clear),
        } => {
            calc.clear_history();
            println!("History cleared.");
            Ok(ExitCode::SUCCESS)
        }
        Command::Replay { id } => {
            if !calc.replay(&id) {
                anyhow::bail!("No history entry with id {id}");
            }
            println!("{} = {}", calc.expression(), calc.result());
            Ok(ExitCode::SUCCESS)
        }
        Command::Explain { expression } => {
            let code = eval_once(&mut calc, &expression);
            let Some(ticket) = calc.begin_explanation() else {
                return Ok(code);
            };
            let backend = Backend::from_config(&config)?;
            let explanation =
                explain_or_fallback(&backend, ticket.expression(), ticket.result()).await;
            calc.finish_explanation(&ticket, explanation);
            if let Some(explanation) = calc.explanation() {
                print_explanation(explanation);
            }
            Ok(code)
        }
        Command::Repl => {
            let backend = Arc::new(Backend::from_config(&config)?);
            repl::run(calc, backend).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn eval_once(calc: &mut Calculator<FileStorage>, expression: &str) -> ExitCode {
    calc.input(expression);
    match calc.evaluate() {
        Outcome::Skipped => ExitCode::SUCCESS,
        Outcome::Success(entry) => {
            println!("{}", entry.result());
            ExitCode::SUCCESS
        }
        Outcome::Malformed(error) => {
            debug!(%error, "Evaluation failed");
            println!("{ERROR_MARKER}");
            ExitCode::FAILURE
        }
    }
}

pub fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("History is empty.");
        return;
    }
    for (index, entry) in entries.iter().enumerate() {
        let when = chrono::DateTime::from_timestamp_millis(entry.timestamp())
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "{:>2}. {}  {}  {} = {}",
            index + 1,
            entry.id(),
            when,
            entry.expression(),
            entry.result()
        );
    }
}

pub fn print_explanation(explanation: &Explanation) {
    println!("Steps:");
    for (i, step) in explanation.step_by_step.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
    println!("Concept: {}", explanation.concept);
    println!("In the real world: {}", explanation.real_world_usage);
}
