//! HTTP request handlers for the image API.
//!
//! # Endpoints
//!
//! - `POST /image` - Upload an image (multipart field `image`)
//! - `GET /image/{name}` - Fetch a stored image
//! - `DELETE /image?name={name}` - Delete a stored image
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, Query, Request, State,
    },
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, error, warn};

use crate::codec::ImageCodec;
use crate::error::DepotError;
use crate::naming::StoredName;
use crate::pipeline::ImageService;
use crate::store::{ImageStore, StagedUpload, StagingArea};

use super::origin::RequestOrigin;

/// Route prefix for stored images.
pub const IMAGE_ROUTE: &str = "/image";

/// Multipart field carrying the upload.
pub const IMAGE_FIELD: &str = "image";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the image service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<C: ImageCodec, S: ImageStore> {
    /// Ingestion and deletion pipeline
    pub service: Arc<ImageService<C, S>>,

    /// Whether returned URLs honour `X-Forwarded-*` headers
    pub trust_proxy: bool,
}

impl<C: ImageCodec, S: ImageStore> AppState<C, S> {
    pub fn new(service: ImageService<C, S>) -> Self {
        Self::from_shared(Arc::new(service))
    }

    /// Wrap an already shared service.
    pub fn from_shared(service: Arc<ImageService<C, S>>) -> Self {
        Self {
            service,
            trust_proxy: false,
        }
    }

    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }
}

impl<C: ImageCodec, S: ImageStore> Clone for AppState<C, S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            trust_proxy: self.trust_proxy,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for delete requests.
#[derive(Debug, Deserialize)]
pub struct DeleteQueryParams {
    /// Name returned by a previous upload
    #[serde(default)]
    pub name: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "no_file")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

impl DepotError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DepotError::NoFile
            | DepotError::MissingName
            | DepotError::InvalidName { .. }
            | DepotError::PathTraversal { .. }
            | DepotError::Upload { .. }
            | DepotError::InvalidHost { .. } => StatusCode::BAD_REQUEST,

            DepotError::NotFound { .. } => StatusCode::NOT_FOUND,

            DepotError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            DepotError::Decode { .. } | DepotError::UnsupportedFormat { .. } => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }

            DepotError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert DepotError to HTTP response.
///
/// 5xx errors are logged at ERROR, 404s at DEBUG, other 4xx at WARN.
impl IntoResponse for DepotError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.kind();
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

fn multipart_error(err: MultipartError) -> DepotError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DepotError::PayloadTooLarge {
            message: err.body_text(),
        }
    } else {
        DepotError::Upload {
            message: err.body_text(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle image uploads.
///
/// # Endpoint
///
/// `POST /image` with a `multipart/form-data` body holding exactly one
/// `image` field. Other fields are ignored.
///
/// # Response
///
/// - `200 OK`: JSON string with the absolute URL of the stored image
/// - `400 Bad Request`: No `image` field, more than one, or no usable host for the URL
/// - `413 Payload Too Large`: Body exceeds the configured limit
/// - `415 Unsupported Media Type`: The upload is not a readable image
/// - `500 Internal Server Error`: Storage failure
pub async fn upload_handler<C: ImageCodec, S: ImageStore>(
    State(state): State<AppState<C, S>>,
    headers: HeaderMap,
    uri: Uri,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<String>, DepotError> {
    // A non-multipart body is treated like a multipart body without the field
    let multipart = multipart.map_err(|rejection| {
        debug!("Upload without multipart body: {}", rejection);
        DepotError::NoFile
    })?;

    let origin = RequestOrigin::resolve(&headers, &uri, state.trust_proxy)?;

    let upload = stage_image_field(state.service.staging(), multipart).await?;
    let stored = state.service.ingest(upload).await?;

    let url = origin.public_url(IMAGE_ROUTE, &stored.name);
    Ok(Json(url.to_string()))
}

/// Stream the single `image` field into a staged file.
async fn stage_image_field(
    staging: &StagingArea,
    mut multipart: Multipart,
) -> Result<StagedUpload, DepotError> {
    let mut staged: Option<StagedUpload> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        if staged.is_some() {
            debug!("Rejecting upload with more than one image field");
            return Err(DepotError::NoFile);
        }

        let (upload, mut file) = staging.create(field.file_name().map(str::to_string)).await?;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        staged = Some(upload);
    }

    staged.ok_or(DepotError::NoFile)
}

/// Handle delete requests.
///
/// # Endpoint
///
/// `DELETE /image?name={name}`
///
/// # Response
///
/// - `200 OK`: `ok`
/// - `400 Bad Request`: Missing name, or a name that is not a single path segment
/// - `404 Not Found`: No such image
pub async fn delete_handler<C: ImageCodec, S: ImageStore>(
    State(state): State<AppState<C, S>>,
    Query(query): Query<DeleteQueryParams>,
) -> Result<&'static str, DepotError> {
    state.service.delete(query.name.as_deref()).await?;
    Ok("ok")
}

/// Serve a stored image.
///
/// # Endpoint
///
/// `GET /image/{name}`
///
/// Names that could not have been generated are answered with 404 without
/// touching the filesystem.
pub async fn serve_handler<C: ImageCodec, S: ImageStore>(
    State(state): State<AppState<C, S>>,
    Path(name): Path<String>,
    request: Request,
) -> Result<Response, DepotError> {
    let name = StoredName::parse(&name).map_err(|_| DepotError::NotFound { name })?;
    let path = state.service.store().path_of(&name);

    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    Ok(response.map(Body::new))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
