//! Command-line interface for cgtbrain.
//!
//! Provides commands for running analyses, inspecting raw responses,
//! rendering reports, asking follow-up questions, and sharing or
//! emailing results.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::client::{analyze_with_fallback, AnalysisBackend, ChatMessage, HttpBackend, ResponseMode};
use crate::config;
use crate::domain::TimelineEvent;
use crate::normalize::{normalize, LlmProvider};
use crate::report;
use crate::state::{FileFlagStore, FlagStore, FEEDBACK_SHOWN};
use crate::store::{ReportId, ReportStore};

/// cgtbrain - CGT analysis client and report tooling
#[derive(Parser, Debug)]
#[command(name = "cgtbrain")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a timeline for CGT analysis
    Analyze {
        /// Timeline JSON file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Request a markdown answer instead of structured sections
        #[arg(long)]
        markdown: bool,

        /// LLM provider (deepseek, claude, openai, olmo)
        #[arg(short, long)]
        provider: Option<String>,

        /// Archive the response in the local report store
        #[arg(short, long)]
        save: bool,
    },

    /// Inspect a raw response file: detected shape and summary
    Normalize {
        /// Response JSON file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Render a saved response as a markdown report
    Report {
        /// Response JSON file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Timeline file to append a locally computed cost-base breakdown
        #[arg(short, long)]
        timeline: Option<PathBuf>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask a follow-up question within an analysis session
    FollowUp {
        /// Session id from a previous analysis
        session_id: String,

        /// The question to ask
        question: String,

        /// LLM provider (deepseek, claude, openai, olmo)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Save a timeline for sharing and print the share link
    Share {
        /// Timeline JSON file
        input: PathBuf,
    },

    /// Email a rendered report as an attachment
    Email {
        /// Rendered report file to attach
        input: PathBuf,

        /// Recipient email address
        #[arg(short, long)]
        to: String,

        /// Attachment filename (defaults to the input file name)
        #[arg(short, long)]
        filename: Option<String>,
    },

    /// Manage locally archived reports
    Reports {
        #[command(subcommand)]
        command: ReportsCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Subcommand, Debug)]
pub enum ReportsCommands {
    /// List archived reports
    List,

    /// Render an archived report
    Show {
        /// Report id
        id: String,
    },

    /// Remove an archived report
    Remove {
        /// Report id
        id: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Analyze {
                input,
                markdown,
                provider,
                save,
            } => run_analyze(input, markdown, provider, save).await,
            Commands::Normalize { input } => run_normalize(input),
            Commands::Report {
                input,
                timeline,
                output,
            } => run_report(input, timeline, output),
            Commands::FollowUp {
                session_id,
                question,
                provider,
            } => run_follow_up(&session_id, &question, provider).await,
            Commands::Share { input } => run_share(&input).await,
            Commands::Email {
                input,
                to,
                filename,
            } => run_email(&input, &to, filename).await,
            Commands::Reports { command } => execute_reports(command).await,
            Commands::Config => show_config(),
        }
    }
}

/// Read JSON from a file or stdin
fn read_json_input(input: Option<&Path>) -> Result<Value> {
    let content = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            buffer
        }
    };

    if content.trim().is_empty() {
        anyhow::bail!("Input is empty. Use --input <file> or pipe to stdin");
    }

    serde_json::from_str(&content).context("Input is not valid JSON")
}

/// Resolve the provider from the CLI flag, falling back to config
fn resolve_provider(flag: Option<String>) -> Result<LlmProvider> {
    let name = match flag {
        Some(name) => name,
        None => config::config()?.analysis.llm_provider.clone(),
    };
    Ok(LlmProvider::from_display_name(&name))
}

/// Parse timeline events out of a timeline payload. Accepts either a
/// bare array or the full timeline object with an `events` field.
fn timeline_events(timeline: &Value) -> Result<Vec<TimelineEvent>> {
    let events = timeline.get("events").unwrap_or(timeline);
    serde_json::from_value(events.clone()).context("Timeline does not contain valid events")
}

async fn run_analyze(
    input: Option<PathBuf>,
    markdown: bool,
    provider: Option<String>,
    save: bool,
) -> Result<()> {
    let timeline = read_json_input(input.as_deref())?;
    let provider = resolve_provider(provider)?;
    let mode = if markdown {
        ResponseMode::Markdown
    } else {
        ResponseMode::Json
    };

    let backend = HttpBackend::from_config()?;
    let response = analyze_with_fallback(&backend, &timeline, mode, provider).await?;
    let normalized = normalize(&response);

    print!("{}", report::render(&normalized));

    if let Some(session_id) = &normalized.session.session_id {
        eprintln!("\n[session {} - use 'cgtbrain follow-up' to ask questions]", session_id);
    }

    if save {
        let store = ReportStore::open()?;
        let id = store.save(&normalized).await?;
        eprintln!("[saved as report {}]", id);
    }

    offer_feedback_prompt().await;

    Ok(())
}

/// One-time hint after the first completed analysis. Failures here are
/// ignored; the prompt is not worth failing the command for.
async fn offer_feedback_prompt() {
    let Ok(flags) = FileFlagStore::open() else {
        return;
    };

    if let Ok(false) = flags.is_set(FEEDBACK_SHOWN).await {
        eprintln!("\n[First analysis complete. Feedback: https://cgtbrain.com.au/feedback]");
        let _ = flags.set(FEEDBACK_SHOWN).await;
    }
}

fn run_normalize(input: Option<PathBuf>) -> Result<()> {
    let response = read_json_input(input.as_deref())?;
    let normalized = normalize(&response);

    println!("Shape: {:?}", normalized.shape);
    println!("Display mode: {:?}", normalized.mode);
    println!("Properties: {}", normalized.property_count());
    println!(
        "Session: {}",
        normalized.session.session_id.as_deref().unwrap_or("(none)")
    );
    println!("Provider: {}", normalized.session.llm_provider);

    if normalized.needs_clarification() {
        println!("Clarification questions: {}", normalized.gap_questions.len());
    }
    if let Some(citations) = &normalized.citations {
        println!("Citations: {}", citations.references.len());
    }

    Ok(())
}

fn run_report(
    input: Option<PathBuf>,
    timeline: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let response = read_json_input(input.as_deref())?;
    let normalized = normalize(&response);

    let mut rendered = report::render(&normalized);

    if let Some(timeline_path) = timeline {
        let timeline = read_json_input(Some(&timeline_path))?;
        let events = timeline_events(&timeline)?;
        rendered.push_str(&report::render_timeline_costs(&events));
    }

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            eprintln!("[report written to {}]", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

async fn run_follow_up(
    session_id: &str,
    question: &str,
    provider: Option<String>,
) -> Result<()> {
    let provider = resolve_provider(provider)?;
    let backend = HttpBackend::from_config()?;

    let asked = ChatMessage::user(question.to_string());
    let reply = backend.follow_up(session_id, question, provider).await?;
    let answer = ChatMessage::assistant(reply);

    println!("> {}", asked.content);
    println!();
    println!("{}", answer.content);

    if let Some(sources) = &answer.sources {
        if !sources.references.is_empty() {
            println!();
            println!("Sources:");
            for reference in &sources.references {
                println!("  - {}", reference.title.as_deref().unwrap_or("Untitled"));
            }
        }
    }

    Ok(())
}

async fn run_share(input: &Path) -> Result<()> {
    let timeline = read_json_input(Some(input))?;

    let backend = HttpBackend::from_config()?;
    let share_id = backend.share_timeline(&timeline).await?;

    println!("{}", backend.share_link(&share_id));
    Ok(())
}

async fn run_email(input: &Path, to: &str, filename: Option<String>) -> Result<()> {
    let content = std::fs::read(input)
        .with_context(|| format!("Failed to read report file: {}", input.display()))?;

    let filename = filename.unwrap_or_else(|| {
        input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cgt-report.pdf".to_string())
    });

    let backend = HttpBackend::from_config()?;
    backend.send_report_email(to, content, &filename).await?;

    println!("Report sent to {}", to);
    Ok(())
}

async fn execute_reports(command: ReportsCommands) -> Result<()> {
    let store = ReportStore::open()?;

    match command {
        ReportsCommands::List => {
            let entries = store.list().await?;
            if entries.is_empty() {
                println!("No saved reports");
                return Ok(());
            }

            println!("{:<14} {:<22} {:<20} {:<6} QUERY", "ID", "SAVED", "SHAPE", "PROPS");
            println!("{}", "-".repeat(80));
            for entry in entries {
                println!(
                    "{:<14} {:<22} {:<20} {:<6} {}",
                    entry.id,
                    entry.saved_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.shape,
                    entry.property_count,
                    entry.query.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
        ReportsCommands::Show { id } => {
            let payload = store.get(&ReportId::from(id.as_str())).await?;
            let normalized = normalize(&payload);
            print!("{}", report::render(&normalized));
            Ok(())
        }
        ReportsCommands::Remove { id } => {
            store.remove(&ReportId::from(id.as_str())).await?;
            println!("Removed report {}", id);
            Ok(())
        }
    }
}

fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("cgtbrain configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:           {}", cfg.home.display());
    println!("  Report catalog: {}", config::catalog_path()?.display());
    println!("  Report archive: {}", config::reports_dir()?.display());
    println!("  Flags:          {}", config::flags_path()?.display());
    println!();
    println!("Endpoints:");
    println!("  Analyze:   {}", cfg.endpoints.analyze_url);
    println!("  Follow-up: {}", cfg.endpoints.follow_up_url);
    println!("  Share:     {}", cfg.endpoints.share_url);
    println!("  Email:     {}", cfg.endpoints.email_url);
    println!();
    println!("Analysis:");
    println!("  Provider: {}", cfg.analysis.llm_provider);
    println!("  Timeout:  {}s", cfg.analysis.timeout_seconds);

    Ok(())
}
