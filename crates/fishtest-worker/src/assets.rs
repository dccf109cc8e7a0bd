//! Named assets (opening books, match tool archives) from the asset index.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::error::{WorkerError, WorkerResult};
use crate::fetch::Fetcher;

/// Git tree listing returned by the asset index.
#[derive(Debug, Deserialize)]
struct TreeListing {
    tree: Vec<TreeEntry>,
}

/// One file in the asset tree.
#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    url: String,
}

/// Blob response; `content` is base64 wrapped at fixed width.
#[derive(Debug, Deserialize)]
struct Blob {
    content: String,
}

/// Downloads assets listed in the repository's asset tree.
#[derive(Debug, Clone)]
pub struct AssetInstaller {
    fetcher: Fetcher,
    tree_url: String,
}

impl AssetInstaller {
    pub fn new(fetcher: Fetcher, config: &Config) -> Self {
        Self {
            fetcher,
            tree_url: config.asset_tree_url(),
        }
    }

    /// Download `name` into `dest_dir`, replacing any existing file.
    ///
    /// Archives are written as-is; unpacking is up to the caller.
    pub async fn install_named_asset(&self, name: &str, dest_dir: &Path) -> WorkerResult<PathBuf> {
        let listing: TreeListing = self.fetcher.get_json(&self.tree_url).await?;

        let entry = listing
            .tree
            .iter()
            .find(|entry| entry.path == name)
            .ok_or_else(|| WorkerError::AssetNotFound(name.to_string()))?;

        info!(asset = %name, "Downloading asset");
        let blob: Blob = self.fetcher.get_json(&entry.url).await?;
        let bytes = decode_blob_content(name, &blob.content)?;

        let destination = dest_dir.join(name);
        tokio::fs::write(&destination, &bytes).await?;
        info!(
            asset = %name,
            path = %destination.display(),
            bytes = bytes.len(),
            "Asset installed"
        );
        Ok(destination)
    }

    /// Download `name` only when it is not already present in `dest_dir`.
    pub async fn ensure_asset(&self, name: &str, dest_dir: &Path) -> WorkerResult<PathBuf> {
        let destination = dest_dir.join(name);
        if tokio::fs::try_exists(&destination).await? {
            return Ok(destination);
        }
        self.install_named_asset(name, dest_dir).await
    }
}

/// Decode base64 blob content, ignoring the line breaks the index inserts.
pub fn decode_blob_content(name: &str, content: &str) -> WorkerResult<Vec<u8>> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| WorkerError::InvalidAsset {
            name: name.to_string(),
            reason: e.to_string(),
        })
}
