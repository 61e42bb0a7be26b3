// crates/server/src/lib.rs
//! amdl-web server library.
//!
//! Axum HTTP control plane for the command-line downloader: dependency
//! checks and installs, config editing, and download sessions whose progress
//! is streamed to the browser over SSE.

pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod stream;

pub use error::*;
pub use metrics::{init_metrics, render_metrics};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use amdl_web_observability::http_trace_layer;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes under `/api`
/// - CORS (allows any origin; the UI may be served from elsewhere)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(http_trace_layer())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let (app, _dir) = test_app();
        let (_, headers, _) = send(
            app,
            Request::builder()
                .uri("/api/health")
                .header("Origin", "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (app, _dir) = test_app();
        let (_, headers, _) = send(
            app,
            Request::builder()
                .method("OPTIONS")
                .uri("/api/download")
                .header("Origin", "http://localhost:3000")
                .header("Access-Control-Request-Method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert!(headers.contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_404_for_unknown_route() {
        let (app, _dir) = test_app();
        let (status, _) = get_text(app, "/api/nonexistent").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_404_for_non_api_path() {
        let (app, _dir) = test_app();
        let (status, _) = get_text(app, "/health").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let (app, _dir) = test_app();
        let (status, _) = post_json(app.clone(), "/api/health", "{}").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = get_text(app, "/api/search").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
