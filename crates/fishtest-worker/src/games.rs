//! Playing a task's games and accumulating its statistics.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use fishtest_core::{Run, RunId, RunStats, TaskId, WorkerInfo};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::archive;
use crate::assets::AssetInstaller;
use crate::builder::{engine_paths, EngineBuilder};
use crate::config::Config;
use crate::error::{WorkerError, WorkerResult};
use crate::fetch::Fetcher;
use crate::platform::Platform;
use crate::reporter::ProgressReporter;
use crate::score::StatsAccumulator;
use crate::signature::verify_signature;

/// Wrapper script shipped in the match tool archive.
pub const MATCH_SCRIPT: &str = "cutechess-cli.sh";

/// Games file written by the match tool.
pub const RESULTS_FILE: &str = "results.pgn";

/// Buffered match tool output lines between reader and consumer.
const LINE_BUFFER: usize = 256;

/// Match tool stderr kept for the failure message; older output is dropped.
const STDERR_TAIL: usize = 16 * 1024;

/// How a `run_games` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The task already had all of its games; nothing was launched.
    NothingToDo(RunStats),
    /// The match tool ran to completion.
    Completed(RunStats),
}

impl RunOutcome {
    /// Cumulative statistics of the task.
    pub fn stats(&self) -> RunStats {
        match self {
            Self::NothingToDo(stats) | Self::Completed(stats) => *stats,
        }
    }
}

/// Who and what progress reports are about.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub worker: &'a WorkerInfo,
    pub run_id: &'a RunId,
    pub task_id: TaskId,
}

/// A fully specified match tool invocation.
#[derive(Debug, Clone)]
pub struct MatchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

/// Prepares assets and engines, then runs the match tool for one task.
pub struct MatchRunner {
    platform: Platform,
    installer: AssetInstaller,
    builder: EngineBuilder,
    reporter: Arc<dyn ProgressReporter>,
}

impl MatchRunner {
    /// Create a runner whose components share one fetcher built from `config`.
    pub fn new(
        config: &Config,
        platform: Platform,
        reporter: Arc<dyn ProgressReporter>,
    ) -> WorkerResult<Self> {
        let fetcher = Fetcher::new(config)?;
        Ok(Self {
            installer: AssetInstaller::new(fetcher.clone(), config),
            builder: EngineBuilder::new(fetcher, platform.clone(), config.clone()),
            platform,
            reporter,
        })
    }

    /// Play the remaining games of `task_id` and return the cumulative statistics.
    ///
    /// Both engines are rebuilt on every call, even when resuming, so the
    /// binaries always match the run's revisions.
    pub async fn run_games(
        &self,
        testing_dir: &Path,
        worker: &WorkerInfo,
        run: &Run,
        task_id: TaskId,
    ) -> WorkerResult<RunOutcome> {
        let task = run.task(task_id)?;
        let prior = task.stats;
        let games_remaining = task.games_remaining();

        if games_remaining == 0 {
            info!(run_id = %run.id, task_id = %task_id, "No games remaining");
            return Ok(RunOutcome::NothingToDo(prior));
        }

        info!(
            run_id = %run.id,
            task_id = %task_id,
            games_remaining = games_remaining,
            ?prior,
            "Starting task"
        );

        tokio::fs::create_dir_all(testing_dir).await?;
        let testing_dir = tokio::fs::canonicalize(testing_dir).await?;
        let args = &run.args;

        if !args.book.is_empty() {
            self.installer.ensure_asset(&args.book, &testing_dir).await?;
        }
        self.ensure_match_tool(&testing_dir).await?;

        let (base_engine, new_engine) = engine_paths(&testing_dir, &self.platform);
        self.builder.build(&args.resolved_base, &base_engine).await?;
        self.builder.build(&args.resolved_new, &new_engine).await?;

        let results = testing_dir.join(RESULTS_FILE);
        if tokio::fs::try_exists(&results).await? {
            tokio::fs::remove_file(&results).await?;
        }

        verify_signature(&base_engine, &args.base_signature).await?;
        verify_signature(&new_engine, &args.new_signature).await?;

        let command = MatchCommand {
            program: testing_dir.join(MATCH_SCRIPT),
            args: vec![
                games_remaining.to_string(),
                args.tc.clone(),
                args.book.clone(),
                args.book_depth.clone(),
                worker.concurrency.to_string(),
            ],
            working_dir: testing_dir.clone(),
        };
        let ctx = ReportContext {
            worker,
            run_id: &run.id,
            task_id,
        };

        let stats = self.run_match(&command, ctx, prior).await?;
        info!(run_id = %run.id, task_id = %task_id, ?stats, "Task finished");
        Ok(RunOutcome::Completed(stats))
    }

    /// Install and unpack the match tool unless its binary is already present.
    async fn ensure_match_tool(&self, testing_dir: &Path) -> WorkerResult<()> {
        let binary = testing_dir.join(self.platform.exe_name("cutechess-cli"));

        if !tokio::fs::try_exists(&binary).await? {
            let archive_name = &self.platform.match_tool_archive;
            let archive_path = self
                .installer
                .install_named_asset(archive_name, testing_dir)
                .await?;
            archive::unpack(&archive_path, testing_dir).await?;
            tokio::fs::remove_file(&archive_path).await?;
        }

        archive::set_executable(&testing_dir.join(MATCH_SCRIPT))?;
        if tokio::fs::try_exists(&binary).await? {
            archive::set_executable(&binary)?;
        }
        Ok(())
    }

    /// Run the match tool, reporting cumulative statistics per score line.
    pub async fn run_match(
        &self,
        command: &MatchCommand,
        ctx: ReportContext<'_>,
        prior: RunStats,
    ) -> WorkerResult<RunStats> {
        info!(
            program = %command.program.display(),
            args = ?command.args,
            "Launching match tool"
        );

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WorkerError::Spawn {
                program: command.program.display().to_string(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| WorkerError::Io(missing_pipe("stdout")))?;
        let stderr = child.stderr.take().ok_or_else(|| WorkerError::Io(missing_pipe("stderr")))?;

        let (line_tx, line_rx) = mpsc::channel(LINE_BUFFER);
        let reader = tokio::spawn(forward_lines(stdout, line_tx));
        let stderr_collector = tokio::spawn(collect_stderr(stderr));

        let stats = self.consume_output(line_rx, ctx, prior).await;

        let status = child.wait().await?;
        if let Err(e) = reader.await {
            warn!(error = %e, "Match tool stdout reader failed");
        }
        let stderr_text = stderr_collector.await.unwrap_or_default();

        let exit_code = status.code();
        info!(exit_code = ?exit_code, success = status.success(), "Match tool exited");

        if !status.success() {
            return Err(WorkerError::MatchToolFailed {
                code: exit_code,
                stderr: stderr_text,
            });
        }
        Ok(stats)
    }

    /// Drain output lines until the stream closes, reporting every update.
    pub async fn consume_output(
        &self,
        mut lines: mpsc::Receiver<String>,
        ctx: ReportContext<'_>,
        prior: RunStats,
    ) -> RunStats {
        let mut accumulator = StatsAccumulator::new(prior);

        while let Some(line) = lines.recv().await {
            debug!(line = %line, "Match tool output");

            let Some(stats) = accumulator.observe(&line) else {
                continue;
            };

            // Reports are best effort; a lost update must not stop the games.
            if let Err(e) = self
                .reporter
                .report(ctx.worker, ctx.run_id, ctx.task_id, stats)
                .await
            {
                error!(
                    run_id = %ctx.run_id,
                    task_id = %ctx.task_id,
                    ?stats,
                    error = %e,
                    "Exception from calling update_task"
                );
            }
        }

        accumulator.current()
    }
}

fn missing_pipe(name: &str) -> std::io::Error {
    std::io::Error::other(format!("match tool {} was not captured", name))
}

/// Forward each line of `stream` to `tx` until EOF or until the receiver goes away.
async fn forward_lines<R>(stream: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break, // EOF
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                error!(error = %e, "Error reading match tool output");
                break;
            }
        }
    }
}

/// Log every stderr line and return the last `STDERR_TAIL` bytes of it.
async fn collect_stderr<R>(stream: R) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut collected = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let trimmed = line.trim_end();
                if !trimmed.is_empty() {
                    warn!(stderr = %trimmed, "Match tool stderr");
                }
                collected.push_str(&line);
                keep_tail(&mut collected, STDERR_TAIL);
            }
            Err(e) => {
                error!(error = %e, "Error reading match tool stderr");
                break;
            }
        }
    }

    collected
}

/// Drop leading bytes of `text` until it is at most `max` bytes long.
fn keep_tail(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = text.len() - max;
    while !text.is_char_boundary(cut) {
        cut += 1;
    }
    text.drain(..cut);
}
