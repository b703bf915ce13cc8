//! HTTP surface: the menu upload endpoint over axum.
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | POST | `/api/upload-menu` | multipart field `menu` → `{ success, data: { name, categories } }` |
//! | GET  | `/health` | liveness and version |

pub mod error;
pub mod handlers;
pub mod types;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::scan::MenuScanner;
pub use types::{ApiState, DEFAULT_BODY_LIMIT_BYTES};

/// Router with the default body limit.
pub fn create_app(scanner: Arc<MenuScanner>) -> Router {
    create_app_with_limit(scanner, DEFAULT_BODY_LIMIT_BYTES)
}

/// Router with an explicit request body limit in bytes.
pub fn create_app_with_limit(scanner: Arc<MenuScanner>, body_limit: usize) -> Router {
    Router::new()
        .route("/api/upload-menu", post(handlers::upload_menu_handler))
        .route("/health", get(handlers::health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ApiState { scanner })
}

/// Bind `addr` and serve until the process is stopped.
pub async fn start_server(
    addr: SocketAddr,
    scanner: Arc<MenuScanner>,
    body_limit: usize,
) -> std::io::Result<()> {
    tracing::info!("Starting server on {}", addr);

    let app = create_app_with_limit(scanner, body_limit);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    tracing::info!("Upload endpoint: POST http://{}/api/upload-menu", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await
}
