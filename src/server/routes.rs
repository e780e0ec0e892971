//! Router configuration for Image Depot.
//!
//! This module defines the HTTP routes and applies middleware for CORS,
//! request tracing and the upload body limit.
//!
//! # Route Structure
//!
//! ```text
//! /health               - Health check
//! POST   /image         - Upload (multipart field "image")
//! DELETE /image?name=   - Delete a stored image
//! GET    /image/{name}  - Fetch a stored image
//! ```
//!
//! # Example
//!
//! ```ignore
//! use image_depot::{create_router, ImageService, IngestConfig, LocalStore, RasterCodec, RouterConfig};
//!
//! let service = ImageService::new(RasterCodec::default(), LocalStore::new("images"), IngestConfig::default());
//! service.bootstrap().await?;
//!
//! let router = create_router(service, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_handler, health_handler, serve_handler, upload_handler, AppState, IMAGE_ROUTE,
};
use crate::codec::ImageCodec;
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::pipeline::ImageService;
use crate::store::ImageStore;

const IMAGE_FILE_ROUTE: &str = "/image/{name}";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone, Debug)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Request body limit for uploads in bytes
    pub max_upload_bytes: usize,

    /// Whether returned URLs honour `X-Forwarded-*` headers
    pub trust_proxy: bool,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Uploads are limited to 32 MiB
    /// - Forwarded headers are ignored
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            trust_proxy: false,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the upload body limit in bytes.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Build returned URLs from forwarded headers.
    pub fn with_trust_proxy(mut self, enabled: bool) -> Self {
        self.trust_proxy = enabled;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// The service's store must already be bootstrapped; see
/// [`ImageService::bootstrap`].
pub fn create_router<C, S>(service: ImageService<C, S>, config: RouterConfig) -> Router
where
    C: ImageCodec,
    S: ImageStore,
{
    let app_state = AppState::new(service).with_trust_proxy(config.trust_proxy);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route(
            IMAGE_ROUTE,
            post(upload_handler::<C, S>).delete(delete_handler::<C, S>),
        )
        .route(IMAGE_FILE_ROUTE, get(serve_handler::<C, S>))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
