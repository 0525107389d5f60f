//! ingest-watch: follow one resume or story ingestion job from the terminal.

mod catalog;
mod logging;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, ValueEnum};
use tracker_core::{JobKind, JobStatus, TrackedJob};
use tracker_engine::{HttpSnapshotStore, JobTracker, StoreSettings, TrackerSettings};
use tracker_logging::{tracker_info, tracker_warn};

use logging::LogDestination;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Resume,
    Story,
}

impl From<KindArg> for JobKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Resume => JobKind::Resume,
            KindArg::Story => JobKind::Story,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "ingest-watch")]
#[command(about = "Follow the progress of a document ingestion job")]
#[command(version)]
struct Cli {
    /// Job identifier to track
    #[arg(short, long)]
    job: String,

    /// Which pipeline the job runs through
    #[arg(short, long, value_enum, default_value = "resume")]
    kind: KindArg,

    /// Root URL of the job API
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    base_url: String,

    /// Bearer token for the job API
    #[arg(long, env = "INGEST_API_KEY")]
    api_key: Option<String>,

    /// RON phase catalog to use instead of the built-in one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Milliseconds between synthetic activity messages
    #[arg(long, default_value = "4000")]
    ticker_ms: u64,

    /// Where log output goes
    #[arg(long, value_enum, default_value = "file")]
    log: LogDestination,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    let catalog = match &cli.catalog {
        Some(path) => catalog::load(path)?,
        None => catalog::builtin()?,
    };
    let store = HttpSnapshotStore::new(StoreSettings {
        base_url: cli.base_url.clone(),
        api_key: cli.api_key.clone(),
        ..StoreSettings::default()
    })?;
    let tracker = JobTracker::new(
        Arc::new(store),
        Arc::new(catalog),
        TrackerSettings {
            ticker_interval: Duration::from_millis(cli.ticker_ms),
        },
    )?;

    tracker_info!("Tracking job {} ({:?})", cli.job, cli.kind);
    tracker.select(Some(TrackedJob::new(cli.job.clone(), cli.kind.into())));

    let mut views = tracker.watch();
    let outcome = loop {
        let view = views.borrow_and_update().clone();
        let clock = Local::now().format("%H:%M:%S").to_string();
        print!("{}", render::render(&view, &clock));

        if view.error.is_some() {
            break ExitCode::FAILURE;
        }
        if let Some(status) = view.snapshot.as_ref().map(|s| s.status) {
            match status {
                JobStatus::Completed => break ExitCode::SUCCESS,
                JobStatus::Failed => break ExitCode::FAILURE,
                JobStatus::Pending | JobStatus::Processing => {}
            }
        }

        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    tracker_warn!("Tracker went away");
                    break ExitCode::FAILURE;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracker_info!("Interrupted");
                break ExitCode::SUCCESS;
            }
        }
    };

    tracker.dispose();
    Ok(outcome)
}
