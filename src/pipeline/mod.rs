//! Ingestion pipeline.
//!
//! [`ImageService`] sits between the HTTP handlers and the collaborators:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ StagedUpload / name
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              ImageService               │
//! │  ResizePolicy · NameGenerator           │
//! └──────────┬─────────────────┬────────────┘
//!            ▼                 ▼
//!      ImageCodec          ImageStore
//! ```

mod service;

pub use service::{ImageService, IngestConfig, StoredImage};
