//! API Routes
//!
//! Configures the Axum router with the proxy and status endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    fallback_handler, health_handler, proxy_handler, proxyinfo_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /proxy/*target` - Fetch `http://<target>` through the cache
/// - `GET /proxyinfo` - Configuration, stats, cached entries and log
/// - `GET /health` - Health check endpoint
/// - `GET` anything else - Redirect when referred by a proxied page, else /proxyinfo
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/proxy/*target", get(proxy_handler))
        .route("/proxyinfo", get(proxyinfo_handler))
        .route("/health", get(health_handler))
        .fallback(get(fallback_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
