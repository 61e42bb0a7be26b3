//! API route handlers for the amdl-web server.

pub mod auth;
pub mod config;
pub mod dependencies;
pub mod download;
pub mod health;
pub mod metrics;
pub mod search;
pub mod system;
pub mod wrapper;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Health check
/// - GET  /api/system/info - Host descriptor
/// - GET  /api/dependencies/check - External tool status
/// - POST /api/dependencies/install/{name} - Install a tool
/// - POST /api/wrapper/start - Wrapper status and start guidance
/// - GET  /api/config - Current settings
/// - POST /api/config - Update and persist settings
/// - GET  /api/auth/status - Whether a media user token is configured
/// - POST /api/search - Command-line search hint
/// - POST /api/download - Start a download session
/// - GET  /api/download/{id} - JSON snapshot of a session
/// - GET  /api/download/progress/{id} - SSE stream of session progress
/// - GET  /api/metrics - Prometheus metrics
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", system::router())
        .nest("/api", dependencies::router())
        .nest("/api", wrapper::router())
        .nest("/api", config::router())
        .nest("/api", auth::router())
        .nest("/api", search::router())
        .nest("/api", download::router())
        .nest("/api", metrics::router())
        .with_state(state)
}
