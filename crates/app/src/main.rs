//! Terminal front end for the tutoring session.

mod repl;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use services::{
    Clock, LlmConfig, LlmTransport, MockLlmTransport, StudyService, TutorSession,
    transport_from_config,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tutor_core::model::{ExamConfigDraft, MaterialId, MaterialKind, Mode};

use repl::Command;

/// Study a text document with an AI tutor.
#[derive(Parser, Debug)]
#[command(name = "tutor")]
#[command(version, about, long_about = None)]
struct Args {
    /// Extracted text of the document to study
    #[arg(value_name = "DOCUMENT")]
    document: PathBuf,

    /// Extracted text of a past exam or sample paper (repeatable)
    #[arg(short, long = "reference", value_name = "FILE")]
    references: Vec<PathBuf>,

    /// Exam preparation settings as JSON
    #[arg(short, long, value_name = "FILE")]
    exam_config: Option<PathBuf>,

    /// SQLite database URL; sessions are kept in memory when omitted
    #[arg(long, env = "TUTOR_DB_URL", value_name = "URL")]
    db: Option<String>,

    /// Never call the completion service
    #[arg(long)]
    mock: bool,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // RUST_LOG wins over --verbose.
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = LlmConfig::from_env().context("reading TUTOR_* settings")?;
    debug!(?config, "completion settings");

    let storage = match &args.db {
        Some(url) => {
            let url = normalize_sqlite_url(url);
            prepare_sqlite_file(&url)?;
            Storage::sqlite(&url)
                .await
                .with_context(|| format!("opening {url}"))?
        }
        None => Storage::in_memory(),
    };
    let clock = Clock::default();
    let service = StudyService::new(clock, &storage);

    let document_id = import(&service, &args.document, MaterialKind::Study).await?;
    for path in &args.references {
        import(&service, path, MaterialKind::Exam).await?;
    }
    if let Some(path) = &args.exam_config {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let draft: ExamConfigDraft = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        service.save_exam_config(document_id, draft).await?;
    }

    let transport: Arc<dyn LlmTransport> = if args.mock {
        Arc::new(MockLlmTransport::new(config.mock_delay()))
    } else {
        transport_from_config(&config)
    };
    let context = service.open(document_id).await?;
    info!(
        title = context.document.title(),
        references = context.references.len(),
        mock = transport.is_mock(),
        "session ready"
    );
    let session = context.start_session(transport, config.history_window(), clock);

    println!("{}", repl::HELP);
    repl_loop(&session).await?;

    let id = service.record_session(document_id, &session).await?;
    debug!(session_id = id, "session saved");
    print!("{}", repl::render_dashboard(&session.dashboard()));
    Ok(())
}

async fn import(service: &StudyService, path: &Path, kind: MaterialKind) -> anyhow::Result<MaterialId> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    // Extracted PDF text separates pages with form feeds.
    let pages = text.matches('\u{c}').count() + 1;
    let title = path
        .file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
    let id = service
        .import_material(&title, kind, u32::try_from(pages).ok(), text)
        .await?;
    Ok(id)
}

async fn repl_loop(session: &TutorSession) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = repl::parse(&line) else {
            continue;
        };
        match command {
            Command::Quit => break,
            Command::Help => println!("{}", repl::HELP),
            Command::Switch(mode) => {
                session.switch_mode(mode);
                println!("[{mode} mode]");
                match mode {
                    Mode::Quiz => println!("{}", repl::render_outcome(&session.start_quiz().await)),
                    Mode::Dashboard => print!("{}", repl::render_dashboard(&session.dashboard())),
                    Mode::Learn | Mode::Review => {}
                }
            }
            Command::Topic(topic) => {
                session.study_topic(&topic);
                println!("[studying {topic}]");
            }
            Command::Question => {
                let outcome = if session.current_question().is_some() {
                    session.next_question().await
                } else {
                    session.start_quiz().await
                };
                println!("{}", repl::render_outcome(&outcome));
            }
            Command::Answer(answer) => {
                println!("{}", repl::render_outcome(&session.submit_answer(&answer).await));
            }
            Command::Reset => {
                session.reset();
                println!("[session reset]");
            }
            Command::Say(text) => {
                println!("{}", repl::render_outcome(&session.send_message(&text).await));
            }
            Command::Unknown(line) => println!("unknown command: {line} (try /help)"),
        }
    }
    Ok(())
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and its directory) if it does not exist yet.
fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }
    let path = db_url
        .strip_prefix("sqlite://")
        .with_context(|| format!("invalid database URL: {db_url}"))?;
    let path = Path::new(path.split('?').next().unwrap_or(path));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_urls_are_made_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("sqlite:///tmp/t.db"), "sqlite:///tmp/t.db");
        assert_eq!(normalize_sqlite_url("sqlite:/tmp/t.db"), "sqlite:///tmp/t.db");
        assert!(normalize_sqlite_url("t.db").ends_with("/t.db"));
    }

    #[test]
    fn args_accept_repeated_references() {
        let args = Args::try_parse_from([
            "tutor",
            "book.txt",
            "-r",
            "paper1.txt",
            "--reference",
            "paper2.txt",
            "--mock",
        ])
        .unwrap();
        assert_eq!(args.document, PathBuf::from("book.txt"));
        assert_eq!(args.references.len(), 2);
        assert!(args.mock);
        assert!(args.exam_config.is_none());
    }
}
