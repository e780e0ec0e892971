//! Staging area for in-flight uploads.
//!
//! The transport layer streams each upload into its own file here before the
//! pipeline looks at it. A staged file is removed when the pipeline finishes
//! with it, or when its [`StagedUpload`] is dropped on an error path. Files left
//! behind by a crash are swept by [`StagingArea::prepare`] at startup.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tracing::{debug, info, warn};

use super::local::create_dir_if_absent;
use crate::error::DepotError;
use crate::naming::NameGenerator;

/// Name of the staging directory created inside the store by default.
pub const STAGING_DIR_NAME: &str = ".staging";

const STAGED_PREFIX: &str = "upload-";
const STAGED_TOKEN_LENGTH: usize = 16;

// =============================================================================
// Staging Area
// =============================================================================

/// Directory holding staged uploads.
///
/// Keep it on the same filesystem as the store so relocation is a rename.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
    tokens: NameGenerator,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tokens: NameGenerator::new(STAGED_TOKEN_LENGTH),
        }
    }

    /// Staging area at `<store>/.staging`.
    pub fn inside(store_root: &Path) -> Self {
        Self::new(store_root.join(STAGING_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the staging directory and remove stale staged files.
    ///
    /// Returns the number of files swept.
    pub async fn prepare(&self) -> Result<usize, DepotError> {
        create_dir_if_absent(&self.dir).await?;

        let mut swept = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_staged = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(STAGED_PREFIX));
            if !is_staged || !entry.file_type().await?.is_file() {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => swept += 1,
                Err(e) => warn!(path = %entry.path().display(), "Failed to sweep staged file: {}", e),
            }
        }

        if swept > 0 {
            info!(count = swept, dir = %self.dir.display(), "Swept stale staged uploads");
        }
        Ok(swept)
    }

    /// Create a new empty staged file and open it for writing.
    pub async fn create(
        &self,
        original_name: Option<String>,
    ) -> Result<(StagedUpload, File), DepotError> {
        let path = self
            .dir
            .join(format!("{}{}", STAGED_PREFIX, self.tokens.token()));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        debug!(path = %path.display(), "Staging upload");
        Ok((StagedUpload::new(path, original_name), file))
    }
}

// =============================================================================
// Staged Upload
// =============================================================================

/// A temporary file holding the raw bytes of one upload.
///
/// The original filename is kept for logging only; the stored extension comes
/// from the decoder.
#[derive(Debug)]
pub struct StagedUpload {
    path: Option<PathBuf>,
    original_name: Option<String>,
}

impl StagedUpload {
    /// Take ownership of an existing file at `path`.
    pub fn new(path: impl Into<PathBuf>, original_name: Option<String>) -> Self {
        Self {
            path: Some(path.into()),
            original_name,
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    /// Remove the staged file. A file already moved away is not an error.
    pub async fn discard(mut self) {
        if let Some(path) = self.path.take() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed staged upload"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "Failed to remove staged upload: {}", e),
            }
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            // Blocking unlink of one small file; only error paths that skipped
            // `discard()` or `relocate` get here
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), "Failed to remove staged upload: {}", e);
                }
            }
        }
    }
}
