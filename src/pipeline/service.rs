//! Image service orchestrating ingestion and deletion.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         ImageService                            │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                      ingest()                           │    │
//! │  │  1. Read metadata       4. Relocate or resize           │    │
//! │  │  2. Apply policy        5. Remove staged file           │    │
//! │  │  3. Generate name       6. Report stored image          │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌──────────────┐    ┌───────────────┐    ┌──────────────┐    │
//! │    │ ResizePolicy │    │  ImageCodec   │    │  ImageStore  │    │
//! │    └──────────────┘    └───────────────┘    └──────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::{ImageCodec, ImageMetadata};
use crate::error::DepotError;
use crate::naming::{NameGenerator, StoredName, DEFAULT_NAME_LENGTH};
use crate::resize::{ResizeDecision, ResizePolicy};
use crate::store::{ImageStore, StagedUpload, StagingArea};

// =============================================================================
// Ingest Configuration
// =============================================================================

/// Immutable per-deployment settings for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    /// How oversized uploads are downsampled
    pub policy: ResizePolicy,

    /// Random characters per generated name
    pub name_length: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            policy: ResizePolicy::default(),
            name_length: DEFAULT_NAME_LENGTH,
        }
    }
}

impl IngestConfig {
    pub fn new(policy: ResizePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_name_length(mut self, name_length: usize) -> Self {
        self.name_length = name_length;
        self
    }
}

// =============================================================================
// Stored Image
// =============================================================================

/// Outcome of a successful ingest.
#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    /// Generated name inside the store
    #[serde(serialize_with = "serialize_name")]
    pub name: StoredName,

    /// Metadata of the upload as received
    pub source: ImageMetadata,

    /// Dimensions the image was stored at
    pub stored: ResizeDecision,

    /// Whether the image was re-encoded at a smaller size
    pub resized: bool,
}

fn serialize_name<S: serde::Serializer>(name: &StoredName, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(name.as_str())
}

// =============================================================================
// Image Service
// =============================================================================

/// Ingests staged uploads into the store and deletes stored images.
///
/// Holds no mutable state; one instance is shared by every request.
pub struct ImageService<C: ImageCodec, S: ImageStore> {
    codec: Arc<C>,
    store: S,
    staging: StagingArea,
    policy: ResizePolicy,
    names: NameGenerator,
}

impl<C: ImageCodec, S: ImageStore> ImageService<C, S> {
    /// Create a service staging uploads in `<store>/.staging`.
    pub fn new(codec: C, store: S, config: IngestConfig) -> Self {
        let staging = StagingArea::inside(store.root());
        Self::with_staging(codec, store, staging, config)
    }

    /// Create a service with an explicit staging area.
    pub fn with_staging(codec: C, store: S, staging: StagingArea, config: IngestConfig) -> Self {
        Self {
            codec: Arc::new(codec),
            store,
            staging,
            policy: config.policy,
            names: NameGenerator::new(config.name_length),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    pub fn policy(&self) -> ResizePolicy {
        self.policy
    }

    pub fn names(&self) -> &NameGenerator {
        &self.names
    }

    /// Prepare the store and staging directories.
    ///
    /// Must complete before the server accepts connections.
    pub async fn bootstrap(&self) -> Result<(), DepotError> {
        self.store.bootstrap().await?;
        self.staging.prepare().await?;
        Ok(())
    }

    /// Move a staged upload into the store, downsampling it if the policy asks.
    ///
    /// The staged file is removed whether or not ingestion succeeds.
    pub async fn ingest(&self, upload: StagedUpload) -> Result<StoredImage, DepotError> {
        let result = self.materialize(&upload).await;
        upload.discard().await;

        match &result {
            Ok(image) => info!(
                name = %image.name,
                format = %image.source.format,
                width = image.source.width,
                height = image.source.height,
                target_width = image.stored.width,
                target_height = image.stored.height,
                resized = image.resized,
                "Stored image"
            ),
            Err(e) => debug!("Ingest failed: {}", e),
        }

        result
    }

    /// Delete a stored image by caller-supplied name.
    ///
    /// The name is validated before anything touches the filesystem.
    pub async fn delete(&self, name: Option<&str>) -> Result<StoredName, DepotError> {
        let raw = name.filter(|n| !n.is_empty()).ok_or(DepotError::MissingName)?;
        let name = StoredName::parse(raw)?;
        self.store.remove(&name).await?;
        info!(name = %name, "Deleted image");
        Ok(name)
    }

    async fn materialize(&self, upload: &StagedUpload) -> Result<StoredImage, DepotError> {
        let staged = upload.path().to_path_buf();
        debug!(
            path = %staged.display(),
            original_name = upload.original_name().unwrap_or("-"),
            "Ingesting upload"
        );

        let metadata = {
            let codec = Arc::clone(&self.codec);
            let staged = staged.clone();
            run_blocking(move || codec.metadata(&staged)).await?
        };

        let decision = self.policy.decide(metadata.width, metadata.height);
        let name = self.names.generate(metadata.format);
        let resized = !decision.is_unchanged(metadata.width, metadata.height);

        // A collision fails here, before anything could overwrite the existing file
        self.store.reserve(&name).await?;

        let written = if resized {
            self.resize_into(staged, &name, metadata, decision).await
        } else {
            self.store.relocate(&staged, &name).await
        };
        if let Err(e) = written {
            self.discard_partial(&name).await;
            return Err(e);
        }

        Ok(StoredImage {
            name,
            source: metadata,
            stored: decision,
            resized,
        })
    }

    async fn resize_into(
        &self,
        staged: PathBuf,
        name: &StoredName,
        metadata: ImageMetadata,
        decision: ResizeDecision,
    ) -> Result<(), DepotError> {
        let target = self.store.path_of(name);
        let codec = Arc::clone(&self.codec);
        run_blocking(move || codec.resize(&staged, &target, metadata.format, decision)).await
    }

    /// Best-effort removal of a reserved or half-written output file.
    async fn discard_partial(&self, name: &StoredName) {
        match self.store.remove(name).await {
            Ok(()) => debug!(name = %name, "Removed partial output"),
            Err(DepotError::NotFound { .. }) => {}
            Err(e) => warn!(name = %name, "Failed to remove partial output: {}", e),
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, DepotError>
where
    F: FnOnce() -> Result<T, DepotError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DepotError::Storage {
            message: format!("codec task failed: {}", e),
        })?
}

// =============================================================================
// Tests
// =============================================================================
