// crates/server/src/routes/dependencies.rs
//! External tool checks and installs.
//!
//! - GET  /dependencies/check          - status of every tool plus the wrapper
//! - POST /dependencies/install/{name} - install one tool via the package manager

use std::collections::BTreeMap;
use std::sync::Arc;

use amdl_web_core::{check_all, install};
use amdl_web_types::{ActionResponse, DependencyStatus};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::metrics::record_install;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dependencies/check", get(check_dependencies))
        .route("/dependencies/install/{name}", post(install_dependency))
}

/// GET /api/dependencies/check
pub async fn check_dependencies(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, DependencyStatus>> {
    Json(check_all(&state.probe).await)
}

/// POST /api/dependencies/install/{name}
///
/// Always 200: the outcome, including the package manager's own error
/// output, is in the body.
pub async fn install_dependency(Path(name): Path<String>) -> Json<ActionResponse> {
    tracing::info!(dependency = %name, "Install requested");
    let outcome = install::install(&name).await;
    record_install(&name, outcome.is_ok());

    Json(match outcome {
        Ok(()) => ActionResponse::ok_with_message(format!("{name} installed")),
        Err(e) => {
            tracing::warn!(dependency = %name, error = %e, "Install failed");
            ActionResponse::failed(e.to_string())
        }
    })
}
