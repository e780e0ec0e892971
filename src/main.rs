//! Image Depot - an image upload server with tile-budget downsampling.
//!
//! This binary prepares the store, then starts the HTTP server.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_depot::{
    config::Config,
    server::{create_router, RouterConfig},
    ImageService, LocalStore, RasterCodec,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let policy = config.resize_policy();

    info!("Image Depot v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Store: {}", config.store_dir.display());
    info!("  Resize: {} {:?}", policy.mode_name(), policy);
    info!("  Names: {} characters", config.name_length);
    info!(
        "  Upload limit: {} MiB",
        config.max_upload_bytes / (1024 * 1024)
    );

    let codec = RasterCodec::new(config.jpeg_quality);
    let store = LocalStore::new(&config.store_dir);
    let service =
        ImageService::with_staging(codec, store, config.staging_area(), config.ingest_config());

    // The store must exist before the listener accepts anything
    if let Err(e) = service.bootstrap().await {
        error!("Failed to prepare store {}: {}", config.store_dir.display(), e);
        return ExitCode::FAILURE;
    }

    let router = create_router(service, build_router_config(&config));
    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  curl -F image=@photo.jpg http://{}/image", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "image_depot=debug,tower_http=debug"
    } else {
        "image_depot=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_max_upload_bytes(config.max_upload_bytes)
        .with_trust_proxy(config.trust_proxy);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}
