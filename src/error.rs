use thiserror::Error;

/// Errors surfaced by the upload, delete and serve paths.
///
/// Every variant is terminal for the request that produced it. The HTTP
/// mapping lives in [`crate::server::handlers`].
#[derive(Debug, Clone, Error)]
pub enum DepotError {
    /// The multipart body carried no `image` field, or more than one
    #[error("No image uploaded.")]
    NoFile,

    /// A delete request without a `name` query parameter
    #[error("No image name supplied.")]
    MissingName,

    /// The supplied name is not a valid stored name
    #[error("Invalid image name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The supplied name would resolve outside the store directory
    #[error("Image name {name:?} escapes the store directory")]
    PathTraversal { name: String },

    /// The decoder could not read the staged file
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// The decoder recognised the file but the format is not stored by this service
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: String },

    /// Filesystem write, rename or delete failure
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// The named image does not exist in the store
    #[error("Image not found: {name}")]
    NotFound { name: String },

    /// The multipart body could not be read
    #[error("Malformed upload: {message}")]
    Upload { message: String },

    /// The request carried no usable host to build the public URL from
    #[error("Invalid request host: {host:?}")]
    InvalidHost { host: String },

    /// The request body exceeded the configured upload limit
    #[error("Upload too large: {message}")]
    PayloadTooLarge { message: String },
}

impl DepotError {
    /// Short machine-readable identifier used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            DepotError::NoFile => "no_file",
            DepotError::MissingName => "missing_name",
            DepotError::InvalidName { .. } => "invalid_name",
            DepotError::PathTraversal { .. } => "path_traversal",
            DepotError::Decode { .. } => "decode_error",
            DepotError::UnsupportedFormat { .. } => "unsupported_format",
            DepotError::Storage { .. } => "storage_error",
            DepotError::NotFound { .. } => "not_found",
            DepotError::Upload { .. } => "invalid_upload",
            DepotError::InvalidHost { .. } => "invalid_host",
            DepotError::PayloadTooLarge { .. } => "payload_too_large",
        }
    }
}

impl From<std::io::Error> for DepotError {
    fn from(err: std::io::Error) -> Self {
        DepotError::Storage {
            message: err.to_string(),
        }
    }
}

impl From<image::ImageError> for DepotError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => io.into(),
            image::ImageError::Unsupported(e) => DepotError::UnsupportedFormat {
                format: e.to_string(),
            },
            other => DepotError::Decode {
                message: other.to_string(),
            },
        }
    }
}
