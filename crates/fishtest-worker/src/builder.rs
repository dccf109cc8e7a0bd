//! Engine builds from source snapshots.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::archive;
use crate::config::Config;
use crate::error::{WorkerError, WorkerResult};
use crate::fetch::Fetcher;
use crate::platform::Platform;

/// Marker suffix of the source root inside a snapshot archive.
const SOURCE_ROOT_SUFFIX: &str = "/src/";

/// Builds engine binaries from revisions of the source repository.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    fetcher: Fetcher,
    platform: Platform,
    config: Config,
}

impl EngineBuilder {
    pub fn new(fetcher: Fetcher, platform: Platform, config: Config) -> Self {
        Self {
            fetcher,
            platform,
            config,
        }
    }

    /// Build `revision` and move the binary to `destination`.
    ///
    /// Every build gets its own working directory under the scratch root,
    /// which is removed before this returns, whether the build succeeded or not.
    pub async fn build(&self, revision: &str, destination: &Path) -> WorkerResult<()> {
        let working_dir = tempfile::Builder::new()
            .prefix("fishtest-build-")
            .tempdir_in(&self.config.scratch_root)?;

        info!(
            revision = %revision,
            working_dir = %working_dir.path().display(),
            "Building engine"
        );
        let result = self.build_in(revision, working_dir.path(), destination).await;

        let working_path = working_dir.path().to_path_buf();
        if let Err(e) = working_dir.close() {
            warn!(
                working_dir = %working_path.display(),
                error = %e,
                "Failed to remove build directory"
            );
        }

        result
    }

    async fn build_in(
        &self,
        revision: &str,
        working_dir: &Path,
        destination: &Path,
    ) -> WorkerResult<()> {
        let snapshot = self
            .fetcher
            .get(&self.config.zipball_url(revision))
            .await?;
        let archive_path = working_dir.join("sf.zip");
        tokio::fs::write(&archive_path, &snapshot).await?;

        let entries = archive::unpack(&archive_path, working_dir).await?;
        let source_root = find_source_root(&entries).ok_or_else(|| {
            WorkerError::SourceRootMissing {
                revision: revision.to_string(),
            }
        })?;
        let build_root = working_dir.join(source_root);

        let status = Command::new(&self.platform.make_program)
            .args(&self.platform.make_args)
            .current_dir(&build_root)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| WorkerError::Spawn {
                program: self.platform.make_program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(WorkerError::BuildFailed {
                revision: revision.to_string(),
                code: status.code(),
            });
        }

        let binary = build_root.join(self.platform.engine_binary());
        if !tokio::fs::try_exists(&binary).await? {
            return Err(WorkerError::EngineMissing {
                revision: revision.to_string(),
                path: binary,
            });
        }
        relocate(&binary, destination).await?;
        info!(
            revision = %revision,
            destination = %destination.display(),
            "Engine built"
        );
        Ok(())
    }
}

/// Top-most archive entry ending in the source root marker.
pub fn find_source_root(entries: &[String]) -> Option<&str> {
    entries
        .iter()
        .filter(|name| name.ends_with(SOURCE_ROOT_SUFFIX))
        .min_by_key(|name| name.matches('/').count())
        .map(String::as_str)
}

/// Move `from` to `to`, replacing `to`, across filesystems if needed.
async fn relocate(from: &Path, to: &Path) -> WorkerResult<()> {
    if tokio::fs::try_exists(to).await? {
        tokio::fs::remove_file(to).await?;
    }

    if let Err(e) = tokio::fs::rename(from, to).await {
        // Scratch space usually lives on another filesystem than the testing dir.
        debug!(from = %from.display(), to = %to.display(), error = %e, "Rename failed, copying");
        copy_then_remove(from, to).await?;
    }

    archive::set_executable(to)?;
    Ok(())
}

/// Copy `from` over `to`, then delete `from`.
async fn copy_then_remove(from: &Path, to: &Path) -> WorkerResult<()> {
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await?;
    Ok(())
}

/// Paths of the two engines inside a testing directory.
pub fn engine_paths(testing_dir: &Path, platform: &Platform) -> (PathBuf, PathBuf) {
    (
        testing_dir.join(platform.exe_name("base")),
        testing_dir.join(platform.exe_name("stockfish")),
    )
}
