// crates/server/src/routes/search.rs
//! Catalog search is only offered by the command-line tool; this endpoint
//! accepts the UI's query and points there.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<serde_json::Value>,
    pub message: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/search", post(search))
}

/// POST /api/search
pub async fn search(
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Json(request) = body?;
    Ok(Json(SearchResponse {
        results: Vec::new(),
        message: format!(
            "Search feature is available via command line. Use: --search {} \"{}\"",
            request.kind, request.query
        ),
    }))
}
