//! # Image Depot
//!
//! An HTTP image upload server that shrinks oversized images before storing
//! them on local disk.
//!
//! Uploads arrive as `multipart/form-data`, are streamed into a staging
//! area, decoded for their dimensions, and either moved into the store
//! unchanged or resampled so they fit a tile budget. Each stored image gets a
//! random, unguessable name and is served back from `/image/{name}`.
//!
//! ## Features
//!
//! - **Tile-budget resizing**: Images are scaled so `ceil(w/T) * ceil(h/T)` stays within a budget
//! - **Unguessable names**: Random base-24 names, never derived from the client filename
//! - **Safe deletion**: Names are validated as single path segments before touching disk
//! - **Streaming uploads**: Bodies go to disk in chunks, never fully buffered in memory
//!
//! ## Architecture
//!
//! - [`resize`] - Resize policies and the tile-budget arithmetic
//! - [`naming`] - Name generation and stored-name validation
//! - [`codec`] - Decoding, resampling and re-encoding images
//! - [`store`] - The image store and its staging area
//! - [`pipeline`] - Ingestion and deletion
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use image_depot::{create_router, ImageService, IngestConfig, LocalStore, RasterCodec, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ImageService::new(
//!         RasterCodec::default(),
//!         LocalStore::new("images"),
//!         IngestConfig::default(),
//!     );
//!     service.bootstrap().await?;
//!
//!     let router = create_router(service, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod resize;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use codec::{ImageCodec, ImageKind, ImageMetadata, RasterCodec};
pub use config::{Config, ResizeMode};
pub use error::DepotError;
pub use naming::{NameGenerator, StoredName};
pub use pipeline::{ImageService, IngestConfig, StoredImage};
pub use resize::{tile_count, ResizeDecision, ResizePolicy};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
pub use store::{ImageStore, LocalStore, StagedUpload, StagingArea};
