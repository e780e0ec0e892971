//! Image store layer.
//!
//! The store is a flat directory: each stored image is one file whose name is
//! its only index. Uploads land first in a hidden staging directory and are
//! moved or re-encoded into the store by the ingestion pipeline.
//!
//! ```text
//! <store>/
//! ├── 3k9a0dmlh2.jpg      ← addressable as /image/3k9a0dmlh2.jpg
//! ├── f0c1b7n4ea.png
//! └── .staging/           ← never addressable (names may not start with '.')
//!     └── upload-…
//! ```
//!
//! # Components
//!
//! - [`ImageStore`]: filesystem collaborator trait used by the pipeline
//! - [`LocalStore`]: [`ImageStore`] over a local directory
//! - [`StagingArea`] / [`StagedUpload`]: temporary files for in-flight uploads

mod local;
mod staging;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::DepotError;
use crate::naming::StoredName;

pub use local::{create_dir_if_absent, LocalStore, DEFAULT_STORE_DIR};
pub use staging::{StagedUpload, StagingArea, STAGING_DIR_NAME};

// =============================================================================
// ImageStore Trait
// =============================================================================

/// Filesystem collaborator for the ingestion pipeline and deletion.
///
/// Names are always [`StoredName`]s, so implementations never see a
/// caller-supplied string that could resolve outside the store.
#[async_trait]
pub trait ImageStore: Send + Sync + 'static {
    /// Directory the store serves from.
    fn root(&self) -> &Path;

    /// Absolute location of `name` inside the store.
    fn path_of(&self, name: &StoredName) -> PathBuf {
        self.root().join(name.as_str())
    }

    /// Create the store directory if it does not exist yet.
    async fn bootstrap(&self) -> Result<(), DepotError>;

    /// Claim `name` by creating an empty file for it.
    ///
    /// Fails with [`DepotError::Storage`] if a file of that name already
    /// exists, so a name collision never overwrites a stored image. Every
    /// later write to `name` lands on the reserved file.
    async fn reserve(&self, name: &StoredName) -> Result<(), DepotError>;

    /// Move a staged file into the store under a reserved `name`.
    async fn relocate(&self, staged: &Path, name: &StoredName) -> Result<(), DepotError>;

    /// Delete `name`, failing with [`DepotError::NotFound`] if it is absent.
    async fn remove(&self, name: &StoredName) -> Result<(), DepotError>;

    /// Whether `name` currently exists.
    async fn contains(&self, name: &StoredName) -> Result<bool, DepotError>;
}
