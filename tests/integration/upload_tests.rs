//! Upload integration tests.
//!
//! Tests verify:
//! - Small images are stored byte-for-byte
//! - Oversized images are downsampled into the tile budget
//! - Rejected uploads leave nothing behind in staging or the store

use axum::body::Body;
use axum::http::{Request, StatusCode};
use image::ImageFormat;

use image_depot::{tile_count, IngestConfig, ResizePolicy, RouterConfig};

use super::test_utils::{
    body_bytes, error_kind, flat_png, inspect, jpeg_image, png_image, upload_request, url_path, Part,
    TestDepot, BOUNDARY, TEST_HOST,
};

fn small_tiles() -> IngestConfig {
    IngestConfig::new(ResizePolicy::tile_budget(64, 4))
}

// =============================================================================
// Successful Uploads
// =============================================================================

#[tokio::test]
async fn test_small_image_stored_unchanged() {
    let depot = TestDepot::new().await;
    let original = png_image(200, 200);

    let url = depot.upload_ok(&[Part::image(original.clone())]).await;

    assert!(url.starts_with(&format!("http://{}/image/", TEST_HOST)));
    assert!(url.ends_with(".png"), "extension comes from the decoder: {}", url);

    let response = depot.get(&url_path(&url)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    assert_eq!(body_bytes(response).await.as_ref(), original.as_slice());

    assert_eq!(depot.staged_files(), 0);
}

#[tokio::test]
async fn test_oversized_image_fits_tile_budget() {
    let depot = TestDepot::with_config(small_tiles(), RouterConfig::new()).await;
    let policy = ResizePolicy::tile_budget(64, 4);
    let expected = policy.decide(400, 300);

    let url = depot.upload_ok(&[Part::image(png_image(400, 300))]).await;

    let stored = body_bytes(depot.get(&url_path(&url)).await).await;
    let (width, height, format) = inspect(&stored);

    assert_eq!((width, height), (expected.width, expected.height));
    assert!(tile_count(width, height, 64) <= 4);
    assert!(width < 400 && height < 300);
    assert_eq!(format, ImageFormat::Png);
    assert_eq!(depot.staged_files(), 0);
}

#[tokio::test]
async fn test_large_photo_fits_four_tiles() {
    let ingest = IngestConfig::new(ResizePolicy::tile_budget(512, 4));
    let depot = TestDepot::with_config(ingest, RouterConfig::new()).await;

    let url = depot.upload_ok(&[Part::image(flat_png(4000, 3000))]).await;

    let stored = body_bytes(depot.get(&url_path(&url)).await).await;
    let (width, height, _) = inspect(&stored);
    assert!(tile_count(width, height, 512) <= 4);
    assert_eq!((width, height), (1024, 768));
    assert_eq!(depot.staged_files(), 0);
    assert_eq!(depot.stored_files().len(), 1);
}

#[tokio::test]
async fn test_resized_jpeg_stays_jpeg() {
    let depot = TestDepot::with_config(small_tiles(), RouterConfig::new()).await;

    let url = depot.upload_ok(&[Part::image(jpeg_image(300, 400))]).await;
    assert!(url.ends_with(".jpg"));

    let stored = body_bytes(depot.get(&url_path(&url)).await).await;
    let (width, height, format) = inspect(&stored);
    assert_eq!(format, ImageFormat::Jpeg);
    assert!(tile_count(width, height, 64) <= 4);
    assert!(height > width, "orientation is preserved");
}

#[tokio::test]
async fn test_passthrough_policy_keeps_large_image() {
    let ingest = IngestConfig::new(ResizePolicy::Passthrough);
    let depot = TestDepot::with_config(ingest, RouterConfig::new()).await;
    let original = png_image(400, 300);

    let url = depot.upload_ok(&[Part::image(original.clone())]).await;

    let stored = body_bytes(depot.get(&url_path(&url)).await).await;
    assert_eq!(stored.as_ref(), original.as_slice());
}

#[tokio::test]
async fn test_uploads_get_distinct_names() {
    let depot = TestDepot::new().await;
    let data = png_image(16, 16);

    let first = depot.upload_ok(&[Part::image(data.clone())]).await;
    let second = depot.upload_ok(&[Part::image(data)]).await;

    assert_ne!(first, second);
    assert_eq!(depot.stored_files().len(), 2);
}

#[tokio::test]
async fn test_client_filename_is_ignored() {
    let depot = TestDepot::new().await;
    let mut part = Part::image(png_image(16, 16));
    part.filename = Some("../../etc/passwd.jpg");

    let url = depot.upload_ok(&[part]).await;

    assert!(!url.contains("passwd"));
    assert!(url.ends_with(".png"));
}

#[tokio::test]
async fn test_other_fields_are_ignored() {
    let depot = TestDepot::new().await;

    let url = depot
        .upload_ok(&[
            Part::text("caption", "holiday"),
            Part::image(png_image(16, 16)),
        ])
        .await;

    assert!(url.ends_with(".png"));
}

#[tokio::test]
async fn test_forwarded_headers_when_trusted() {
    let depot = TestDepot::with_config(
        IngestConfig::default(),
        RouterConfig::new().with_trust_proxy(true),
    )
    .await;

    let mut request = upload_request(&[Part::image(png_image(16, 16))]);
    request
        .headers_mut()
        .insert("x-forwarded-proto", "https".parse().unwrap());
    request
        .headers_mut()
        .insert("x-forwarded-host", "images.example.com".parse().unwrap());

    let response = depot.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let url: String = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(url.starts_with("https://images.example.com/image/"));
}

// =============================================================================
// Rejected Uploads
// =============================================================================

#[tokio::test]
async fn test_missing_image_field() {
    let depot = TestDepot::new().await;

    let response = depot
        .send(upload_request(&[Part::text("caption", "no file")]))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_kind(response).await, "no_file");
    assert!(depot.stored_files().is_empty());
}

#[tokio::test]
async fn test_non_multipart_body() {
    let depot = TestDepot::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/image")
        .header("host", TEST_HOST)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"image": "nope"}"#))
        .unwrap();

    let response = depot.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_kind(response).await, "no_file");
}

#[tokio::test]
async fn test_two_image_fields_rejected() {
    let depot = TestDepot::new().await;

    let response = depot
        .send(upload_request(&[
            Part::image(png_image(16, 16)),
            Part::image(png_image(16, 16)),
        ]))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_kind(response).await, "no_file");
    assert_eq!(depot.staged_files(), 0);
    assert!(depot.stored_files().is_empty());
}

#[tokio::test]
async fn test_corrupt_image_rejected() {
    let depot = TestDepot::new().await;

    let response = depot
        .send(upload_request(&[Part::image(b"definitely not an image".to_vec())]))
        .await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(error_kind(response).await, "decode_error");
    assert_eq!(depot.staged_files(), 0);
    assert!(depot.stored_files().is_empty());
}

#[tokio::test]
async fn test_truncated_image_rejected() {
    let depot = TestDepot::with_config(small_tiles(), RouterConfig::new()).await;
    let mut data = png_image(400, 300);
    data.truncate(data.len() / 2);

    let response = depot.send(upload_request(&[Part::image(data)])).await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(depot.staged_files(), 0);
    assert!(depot.stored_files().is_empty());
}

#[tokio::test]
async fn test_body_limit() {
    let depot = TestDepot::with_config(
        IngestConfig::default(),
        RouterConfig::new().with_max_upload_bytes(1024),
    )
    .await;

    let response = depot
        .send(upload_request(&[Part::image(vec![0u8; 16 * 1024])]))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(depot.staged_files(), 0);
    assert!(depot.stored_files().is_empty());
}

#[tokio::test]
async fn test_missing_host_rejected() {
    let depot = TestDepot::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/image")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(super::test_utils::multipart_body(&[Part::image(
            png_image(16, 16),
        )])))
        .unwrap();

    let response = depot.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_kind(response).await, "invalid_host");
    assert!(depot.stored_files().is_empty());
}

#[tokio::test]
async fn test_unusable_host_stores_nothing() {
    let depot = TestDepot::new().await;

    for host in ["depot.test:99999", "bad host", "depot.test/extra"] {
        let mut request = upload_request(&[Part::image(png_image(16, 16))]);
        request
            .headers_mut()
            .insert("host", host.parse().unwrap());

        let response = depot.send(request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "host {:?}", host);
        assert_eq!(error_kind(response).await, "invalid_host");
        assert!(depot.stored_files().is_empty(), "host {:?} left a file behind", host);
        assert_eq!(depot.staged_files(), 0);
    }
}
