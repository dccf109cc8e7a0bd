//! Fishtest Worker

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use fishtest_core::{Run, TaskId, WorkerInfo};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fishtest_worker::{Config, HttpReporter, MatchRunner, Platform, RunOutcome};

/// Fishtest worker - plays one task of a run and reports its results
#[derive(Parser)]
#[command(name = "fishtest-worker")]
#[command(about = "Build two engine revisions and play a task's games", long_about = None)]
struct Cli {
    /// Coordination server base URL
    #[arg(short, long, default_value = "http://localhost:6543")]
    remote: String,

    /// Worker account name
    #[arg(short, long)]
    username: String,

    /// Worker account password
    #[arg(short, long)]
    password: String,

    /// Games played in parallel by the match tool
    #[arg(short, long, default_value_t = 1)]
    concurrency: u32,

    /// Directory holding the book, match tool and engines
    #[arg(long, default_value = "testing")]
    testing_dir: PathBuf,

    /// JSON file with the run descriptor
    #[arg(long)]
    run: PathBuf,

    /// Index of the task within the run
    #[arg(long)]
    task_id: usize,

    /// Download attempts before giving up
    #[arg(long, default_value_t = 5)]
    retries: u32,

    /// Seconds between download attempts, multiplied by the attempt number
    #[arg(long, default_value_t = 1)]
    backoff_secs: u64,

    /// Seconds before an unanswered HTTP request is abandoned
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let config = Config {
        remote: cli.remote,
        testing_dir: cli.testing_dir,
        fetch_attempts: cli.retries,
        backoff_unit: Duration::from_secs(cli.backoff_secs),
        request_timeout: Duration::from_secs(cli.timeout_secs),
        ..Default::default()
    };
    let platform = Platform::detect();
    let worker = WorkerInfo::new(cli.username, cli.password, cli.concurrency);

    let run: Run = serde_json::from_slice(&tokio::fs::read(&cli.run).await?)?;
    let task_id = TaskId::new(cli.task_id);

    info!(
        remote = %config.remote,
        run_id = %run.id,
        task_id = %task_id,
        worker = %worker.username,
        "Starting fishtest worker"
    );

    let reporter = Arc::new(HttpReporter::new(&config)?);
    let runner = MatchRunner::new(&config, platform, reporter)?;

    match runner
        .run_games(&config.testing_dir, &worker, &run, task_id)
        .await
    {
        Ok(RunOutcome::NothingToDo(stats)) => {
            info!(?stats, "No games remaining");
            Ok(())
        }
        Ok(RunOutcome::Completed(stats)) => {
            info!(?stats, "Task completed");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Task failed");
            Err(e.into())
        }
    }
}
