use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use score_ingest_core::budget::RunBudget;
use score_ingest_core::config::{IngestionConfig, TABLE_NAME_VAR, TOPIC_VAR};
use score_ingest_core::contract::{completion_response, SourceObject};
use score_ingest_lambda::adapters::clock::SystemClock;
use score_ingest_lambda::adapters::local::{FileObjectSource, InMemoryRecordStore, LoggingNotifier};
use score_ingest_lambda::handlers::ingest::{handle_ingest, Collaborators};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ingest_local",
    about = "Dry-run a student score CSV through the ingestion handler",
    long_about = "Runs the ingestion handler against a local CSV file with an in-memory\n\
                  table and a notifier that only logs, then prints the invocation response."
)]
struct Cli {
    /// CSV file to ingest
    #[arg(long)]
    file: PathBuf,
    /// Table name recorded in the run
    #[arg(long, env = TABLE_NAME_VAR, default_value = "student_scores")]
    table: String,
    /// Notification topic recorded in the run
    #[arg(long, env = TOPIC_VAR, default_value = "local-student-performance-reports")]
    topic: String,
}

fn split_path(file: &Path) -> Result<SourceObject, String> {
    let key = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| format!("{} does not name a file", file.display()))?;
    let container = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    };
    Ok(SourceObject::new(container, key))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = IngestionConfig::from_lookup(|name| match name {
        TABLE_NAME_VAR => Some(cli.table.clone()),
        TOPIC_VAR => Some(cli.topic.clone()),
        other => std::env::var(other).ok(),
    })?;
    let source = split_path(&cli.file)?;

    let records = InMemoryRecordStore::new();
    let collaborators = Collaborators {
        objects: &FileObjectSource,
        records: &records,
        notifier: &LoggingNotifier,
        clock: &SystemClock,
    };

    let result = handle_ingest(&source, &config, &RunBudget::unbounded(), collaborators)?;
    let response = completion_response(&result)?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    tracing::info!(
        component = "ingest_local",
        event = "dry_run_completed",
        stored_items = records.len(),
    );
    Ok(())
}
