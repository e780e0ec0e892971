//! HTTP server layer for Image Depot.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        POST /image · GET /image/{name} · DELETE /image          │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │   origin    │  │        routes           │  │
//! │  │ (requests)  │  │ (public URL)│  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod origin;
pub mod routes;

pub use handlers::{
    delete_handler, health_handler, serve_handler, upload_handler, AppState, DeleteQueryParams,
    ErrorResponse, HealthResponse, IMAGE_FIELD, IMAGE_ROUTE,
};
pub use origin::RequestOrigin;
pub use routes::{create_router, RouterConfig};
