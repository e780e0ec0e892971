//! Configuration management for Image Depot.
//!
//! Settings come from command-line arguments via clap, fall back to
//! environment variables, and otherwise use the defaults below.
//!
//! # Environment Variables
//!
//! - `PORT` - Server port (default: 3000)
//! - `DEPOT_HOST` - Server bind address (default: 0.0.0.0)
//! - `DEPOT_STORE_DIR` - Directory holding stored images (default: images)
//! - `DEPOT_STAGING_DIR` - Directory for in-flight uploads (default: `<store>/.staging`)
//! - `DEPOT_RESIZE_MODE` - `tile-budget`, `long-edge` or `none` (default: tile-budget)
//! - `DEPOT_TILE_SIZE` - Tile edge in pixels (default: 512)
//! - `DEPOT_MAX_TILES` - Tile budget per image (default: 16)
//! - `DEPOT_MAX_EDGE` - Long-edge ceiling in pixels (default: 2048)
//! - `DEPOT_NAME_LENGTH` - Random characters per generated name (default: 10)
//! - `DEPOT_JPEG_QUALITY` - JPEG quality for resized output (default: 80)
//! - `DEPOT_MAX_UPLOAD_BYTES` - Request body limit for uploads (default: 32 MiB)
//! - `DEPOT_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)
//! - `DEPOT_TRUST_PROXY` - Honour `X-Forwarded-Proto`/`X-Forwarded-Host` (default: false)

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::codec::{is_valid_quality, DEFAULT_JPEG_QUALITY};
use crate::naming::{DEFAULT_NAME_LENGTH, MAX_NAME_LENGTH, MIN_NAME_LENGTH};
use crate::pipeline::IngestConfig;
use crate::resize::{ResizePolicy, DEFAULT_MAX_EDGE, DEFAULT_MAX_TILES, DEFAULT_TILE_SIZE};
use crate::store::{StagingArea, DEFAULT_STORE_DIR};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default request body limit for uploads (32 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

// =============================================================================
// Resize Mode
// =============================================================================

/// Resize policy selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResizeMode {
    /// Keep each image within a tile budget
    TileBudget,
    /// Keep the longest side under a ceiling
    LongEdge,
    /// Store uploads unchanged
    None,
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Image Depot - an image upload server with tile-budget downsampling.
///
/// Accepts multipart image uploads, shrinks oversized images, and serves the
/// stored files back under generated names.
#[derive(Parser, Debug, Clone)]
#[command(name = "image-depot")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "DEPOT_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Store Configuration
    // =========================================================================
    /// Directory holding stored images. Its parent must exist.
    #[arg(long, default_value = DEFAULT_STORE_DIR, env = "DEPOT_STORE_DIR")]
    pub store_dir: PathBuf,

    /// Directory for in-flight uploads.
    ///
    /// Defaults to a hidden directory inside the store. On another
    /// filesystem, finished uploads are copied rather than renamed.
    #[arg(long, env = "DEPOT_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    // =========================================================================
    // Resize Configuration
    // =========================================================================
    /// Resize policy applied to uploads.
    #[arg(long, value_enum, default_value_t = ResizeMode::TileBudget, env = "DEPOT_RESIZE_MODE")]
    pub resize_mode: ResizeMode,

    /// Tile edge length in pixels (tile-budget mode).
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "DEPOT_TILE_SIZE")]
    pub tile_size: u32,

    /// Maximum tiles per image (tile-budget mode).
    #[arg(long, default_value_t = DEFAULT_MAX_TILES, env = "DEPOT_MAX_TILES")]
    pub max_tiles: u32,

    /// Maximum length of the longest side in pixels (long-edge mode).
    #[arg(long, default_value_t = DEFAULT_MAX_EDGE, env = "DEPOT_MAX_EDGE")]
    pub max_edge: u32,

    /// JPEG quality for resized output (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "DEPOT_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    // =========================================================================
    // Upload Configuration
    // =========================================================================
    /// Random characters in each generated name (6-64).
    #[arg(long, default_value_t = DEFAULT_NAME_LENGTH, env = "DEPOT_NAME_LENGTH")]
    pub name_length: usize,

    /// Maximum upload request size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "DEPOT_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    // =========================================================================
    // HTTP Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "DEPOT_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Build returned URLs from `X-Forwarded-Proto` and `X-Forwarded-Host`.
    ///
    /// Only enable behind a reverse proxy that sets these headers.
    #[arg(long, default_value_t = false, env = "DEPOT_TRUST_PROXY")]
    pub trust_proxy: bool,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.store_dir.as_os_str().is_empty() {
            return Err("store_dir must not be empty. Set --store-dir or DEPOT_STORE_DIR".to_string());
        }

        match self.resize_mode {
            ResizeMode::TileBudget => {
                if self.tile_size == 0 {
                    return Err("tile_size must be greater than 0".to_string());
                }
                if self.max_tiles == 0 {
                    return Err("max_tiles must be greater than 0".to_string());
                }
            }
            ResizeMode::LongEdge => {
                if self.max_edge == 0 {
                    return Err("max_edge must be greater than 0".to_string());
                }
            }
            ResizeMode::None => {}
        }

        if !is_valid_quality(self.jpeg_quality) {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&self.name_length) {
            return Err(format!(
                "name_length must be between {} and {}",
                MIN_NAME_LENGTH, MAX_NAME_LENGTH
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The resize policy selected by `resize_mode`.
    pub fn resize_policy(&self) -> ResizePolicy {
        match self.resize_mode {
            ResizeMode::TileBudget => ResizePolicy::tile_budget(self.tile_size, self.max_tiles),
            ResizeMode::LongEdge => ResizePolicy::long_edge(self.max_edge),
            ResizeMode::None => ResizePolicy::Passthrough,
        }
    }

    /// Pipeline settings derived from this configuration.
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig::new(self.resize_policy()).with_name_length(self.name_length)
    }

    /// Staging area, defaulting to `<store>/.staging`.
    pub fn staging_area(&self) -> StagingArea {
        match &self.staging_dir {
            Some(dir) => StagingArea::new(dir),
            None => StagingArea::inside(&self.store_dir),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
