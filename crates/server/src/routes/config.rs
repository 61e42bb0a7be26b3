// crates/server/src/routes/config.rs
//! Read and edit `config.yaml` from the UI.

use std::sync::Arc;

use amdl_web_core::ConfigUpdate;
use amdl_web_types::ActionResponse;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

/// Fields the settings page shows.
#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub media_user_token: String,
    pub storefront: String,
    pub alac_save_folder: String,
    pub atmos_save_folder: String,
    pub aac_save_folder: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/config", get(get_config).post(update_config))
}

/// GET /api/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigView> {
    let config = state.config.snapshot();
    Json(ConfigView {
        media_user_token: config.media_user_token,
        storefront: config.storefront,
        alac_save_folder: config.alac_save_folder,
        atmos_save_folder: config.atmos_save_folder,
        aac_save_folder: config.aac_save_folder,
    })
}

/// POST /api/config
///
/// A body that is not a JSON object of strings is a 400; a failed write is
/// reported in the body with 200.
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ConfigUpdate>, JsonRejection>,
) -> ApiResult<Json<ActionResponse>> {
    let Json(update) = body?;
    Ok(Json(match state.config.update(update).await {
        Ok(_) => ActionResponse::ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Config save failed");
            ActionResponse::failed(e.to_string())
        }
    }))
}
