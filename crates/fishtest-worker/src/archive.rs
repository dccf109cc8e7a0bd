//! Zip extraction and executable permissions.

use std::fs::File;
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::error::{WorkerError, WorkerResult};

/// Extract every entry of `archive` below `dest`, returning the entry names.
pub async fn unpack(archive: &Path, dest: &Path) -> WorkerResult<Vec<String>> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || unpack_blocking(&archive, &dest))
        .await
        .map_err(|e| WorkerError::Io(std::io::Error::other(e)))?
}

fn unpack_blocking(archive: &Path, dest: &Path) -> WorkerResult<Vec<String>> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let names: Vec<String> = zip.file_names().map(String::from).collect();
    debug!(
        archive = %archive.display(),
        dest = %dest.display(),
        entries = names.len(),
        "Extracting archive"
    );
    zip.extract(dest)?;
    Ok(names)
}

/// Add the owner execute bit to `path`.
#[cfg(unix)]
pub fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o100);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
pub fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
