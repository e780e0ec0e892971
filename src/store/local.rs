//! Local directory store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tracing::{debug, info, warn};

use super::ImageStore;
use crate::error::DepotError;
use crate::naming::StoredName;

/// Default store directory, relative to the working directory.
pub const DEFAULT_STORE_DIR: &str = "images";

/// Create `dir` (non-recursively) unless it already exists.
///
/// Returns `true` if the directory was created by this call.
pub async fn create_dir_if_absent(dir: &Path) -> Result<bool, DepotError> {
    match tokio::fs::create_dir(dir).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            if tokio::fs::metadata(dir).await?.is_dir() {
                Ok(false)
            } else {
                Err(DepotError::Storage {
                    message: format!("{} exists and is not a directory", dir.display()),
                })
            }
        }
        Err(e) => Err(DepotError::Storage {
            message: format!("failed to create {}: {}", dir.display(), e),
        }),
    }
}

/// Copy `staged` over `target`, then unlink `staged`.
///
/// `target` keeps its own inode, so a reserved file is filled in place.
async fn copy_then_remove(staged: &Path, target: &Path) -> Result<(), DepotError> {
    tokio::fs::copy(staged, target)
        .await
        .map_err(|e| DepotError::Storage {
            message: format!("failed to copy upload to {}: {}", target.display(), e),
        })?;
    if let Err(e) = tokio::fs::remove_file(staged).await {
        warn!(path = %staged.display(), "Failed to remove copied upload: {}", e);
    }
    Ok(())
}

/// [`ImageStore`] backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ImageStore for LocalStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn bootstrap(&self) -> Result<(), DepotError> {
        if create_dir_if_absent(&self.root).await? {
            info!(dir = %self.root.display(), "Created image store");
        }
        Ok(())
    }

    async fn reserve(&self, name: &StoredName) -> Result<(), DepotError> {
        let target = self.path_of(name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(DepotError::Storage {
                message: format!("generated name {} is already taken", name),
            }),
            Err(e) => Err(DepotError::Storage {
                message: format!("failed to create {}: {}", target.display(), e),
            }),
        }
    }

    async fn relocate(&self, staged: &Path, name: &StoredName) -> Result<(), DepotError> {
        let target = self.path_of(name);
        match tokio::fs::rename(staged, &target).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DepotError::Storage {
                    message: format!("staged upload {} vanished: {}", staged.display(), e),
                });
            }
            // A staging directory on another filesystem cannot be renamed across (EXDEV)
            Err(e) => {
                debug!(name = %name, "Rename failed ({}), copying instead", e);
                copy_then_remove(staged, &target).await?;
            }
        }
        debug!(name = %name, "Relocated staged upload");
        Ok(())
    }

    async fn remove(&self, name: &StoredName) -> Result<(), DepotError> {
        match tokio::fs::remove_file(self.path_of(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(DepotError::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn contains(&self, name: &StoredName) -> Result<bool, DepotError> {
        Ok(tokio::fs::try_exists(self.path_of(name)).await?)
    }
}
