//! Test utilities for integration tests.
//!
//! This module builds routers over a throwaway store directory and provides
//! helpers for generating test images and multipart request bodies.

use std::io::Cursor;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;
use image::codecs::jpeg::JpegEncoder;
use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use tower::ServiceExt;

use image_depot::store::STAGING_DIR_NAME;
use image_depot::{
    create_router, ImageService, IngestConfig, LocalStore, RasterCodec, RouterConfig,
};

/// Host header sent with every upload.
pub const TEST_HOST: &str = "depot.test";

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "depot-test-boundary";

// =============================================================================
// Test Depot
// =============================================================================

/// A router backed by a store inside a temporary directory.
///
/// The store lives at `<tempdir>/images` so tests can place files next to it.
pub struct TestDepot {
    pub dir: TempDir,
    pub router: Router,
}

impl TestDepot {
    /// Depot with the default resize policy.
    pub async fn new() -> Self {
        Self::with_config(IngestConfig::default(), RouterConfig::new()).await
    }

    pub async fn with_config(ingest: IngestConfig, router_config: RouterConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let service = ImageService::new(
            RasterCodec::default(),
            LocalStore::new(dir.path().join("images")),
            ingest,
        );
        service.bootstrap().await.unwrap();

        let router = create_router(service, router_config.with_tracing(false));
        Self { dir, router }
    }

    pub fn store_root(&self) -> PathBuf {
        self.dir.path().join("images")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.store_root().join(STAGING_DIR_NAME)
    }

    /// Files left in the staging directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.staging_dir()).unwrap().count()
    }

    /// Names of the regular files in the store.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.store_root())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Upload `parts` and return the returned URL, asserting success.
    pub async fn upload_ok(&self, parts: &[Part]) -> String {
        let response = self.send(upload_request(parts)).await;
        assert_eq!(response.status(), 200, "upload should succeed");
        let body = body_bytes(response).await;
        serde_json::from_slice(&body).unwrap()
    }

    pub async fn get(&self, path: &str) -> Response {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn delete(&self, query: &str) -> Response {
        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/image{}", query))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }
}

// =============================================================================
// Responses
// =============================================================================

pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// The `error` field of a JSON error body.
pub async fn error_kind(response: Response) -> String {
    let body = body_bytes(response).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    json["error"].as_str().unwrap().to_string()
}

/// Path component of a returned URL.
pub fn url_path(url: &str) -> String {
    url::Url::parse(url).unwrap().path().to_string()
}

// =============================================================================
// Multipart Bodies
// =============================================================================

/// One part of a multipart body.
pub struct Part {
    pub name: &'static str,
    pub filename: Option<&'static str>,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

impl Part {
    /// An `image` file field.
    pub fn image(data: Vec<u8>) -> Self {
        Self {
            name: "image",
            filename: Some("photo.bin"),
            content_type: "application/octet-stream",
            data,
        }
    }

    /// A plain form field.
    pub fn text(name: &'static str, value: &str) -> Self {
        Self {
            name,
            filename: None,
            content_type: "text/plain",
            data: value.as_bytes().to_vec(),
        }
    }
}

pub fn multipart_body(parts: &[Part]) -> Bytes {
    let mut body = BytesMut::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let disposition = match part.filename {
            Some(filename) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, filename
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body.freeze()
}

pub fn upload_request(parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/image")
        .header("host", TEST_HOST)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

// =============================================================================
// Test Images
// =============================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

pub fn png_image(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// A large PNG made of flat colour bands, cheap to encode.
pub fn flat_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| Rgb([(x / 500 * 30) as u8, 90, 160]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub fn jpeg_image(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .encode_image(&gradient(width, height))
        .unwrap();
    buf
}

/// Decoded dimensions and format of an encoded image.
pub fn inspect(data: &[u8]) -> (u32, u32, ImageFormat) {
    let format = image::guess_format(data).unwrap();
    let decoded = image::load_from_memory(data).unwrap();
    let (width, height) = decoded.dimensions();
    (width, height, format)
}
