//! Bench signature checks.
//!
//! An engine's `bench` command searches a fixed set of positions and prints
//! the total node count. The count is deterministic for a given source and
//! compiler, so a mismatch means the binary is not the revision we expect.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

const NODES_MARKER: &str = "Nodes searched";

/// Extract the bench node count from `bench` output, or an empty string.
///
/// The count is the field between the first and second `": "` of the last
/// marker line.
pub fn parse_bench_signature(output: &str) -> String {
    output
        .lines()
        .filter(|line| line.contains(NODES_MARKER))
        .filter_map(|line| line.split(": ").nth(1).map(|value| value.trim().to_string()))
        .last()
        .unwrap_or_default()
}

/// Run `engine bench` and return its combined stdout and stderr.
pub async fn run_bench(engine: &Path) -> WorkerResult<String> {
    let output = Command::new(engine)
        .arg("bench")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| WorkerError::Spawn {
            program: engine.display().to_string(),
            source,
        })?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(text)
}

/// Check that `engine` reports `expected` nodes. An empty `expected` disables the check.
pub async fn verify_signature(engine: &Path, expected: &str) -> WorkerResult<()> {
    if expected.is_empty() {
        return Ok(());
    }

    let actual = parse_bench_signature(&run_bench(engine).await?);
    if actual != expected {
        return Err(WorkerError::SignatureMismatch {
            engine: engine.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }

    info!(engine = %engine.display(), signature = %actual, "Bench signature verified");
    Ok(())
}
