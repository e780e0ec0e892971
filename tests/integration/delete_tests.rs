//! Delete and serve integration tests.
//!
//! Tests verify:
//! - Deleted images stop being served
//! - Names that escape the store are rejected before any filesystem access
//! - Unknown and malformed names map to 400/404

use axum::http::StatusCode;

use super::test_utils::{error_kind, png_image, url_path, Part, TestDepot};

fn name_of(url: &str) -> String {
    url_path(url).trim_start_matches("/image/").to_string()
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_then_fetch() {
    let depot = TestDepot::new().await;
    let url = depot.upload_ok(&[Part::image(png_image(16, 16))]).await;
    let name = name_of(&url);

    let response = depot.delete(&format!("?name={}", name)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = depot.get(&url_path(&url)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(depot.stored_files().is_empty());
}

#[tokio::test]
async fn test_delete_twice() {
    let depot = TestDepot::new().await;
    let url = depot.upload_ok(&[Part::image(png_image(16, 16))]).await;
    let query = format!("?name={}", name_of(&url));

    assert_eq!(depot.delete(&query).await.status(), StatusCode::OK);

    let response = depot.delete(&query).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_kind(response).await, "not_found");
}

#[tokio::test]
async fn test_delete_missing_name() {
    let depot = TestDepot::new().await;

    for query in ["", "?name=", "?other=x"] {
        let response = depot.delete(query).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query {:?}", query);
        assert_eq!(error_kind(response).await, "missing_name");
    }
}

#[tokio::test]
async fn test_delete_unknown_name() {
    let depot = TestDepot::new().await;

    let response = depot.delete("?name=0123456789.png").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_rejects_traversal() {
    let depot = TestDepot::new().await;
    let victim = depot.dir.path().join("victim.txt");
    std::fs::write(&victim, b"keep me").unwrap();

    for query in [
        "?name=../victim.txt",
        "?name=..%2Fvictim.txt",
        "?name=..%5Cvictim.txt",
        "?name=..",
    ] {
        let response = depot.delete(query).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query {:?}", query);
        assert_eq!(error_kind(response).await, "path_traversal");
    }

    assert!(victim.exists());
    assert!(depot.store_root().is_dir());
}

#[tokio::test]
async fn test_delete_rejects_hidden_and_absolute_names() {
    let depot = TestDepot::new().await;

    for query in ["?name=.staging", "?name=.", "?name=%2Fetc%2Fpasswd"] {
        let response = depot.delete(query).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query {:?}", query);
    }

    assert!(depot.staging_dir().is_dir());
}

// =============================================================================
// Serve
// =============================================================================

#[tokio::test]
async fn test_fetch_unknown_image() {
    let depot = TestDepot::new().await;

    let response = depot.get("/image/0123456789.png").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fetch_cannot_escape_store() {
    let depot = TestDepot::new().await;
    std::fs::write(depot.dir.path().join("victim.txt"), b"secret").unwrap();

    for path in ["/image/..%2Fvictim.txt", "/image/.staging"] {
        let response = depot.get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {:?}", path);
    }
}
