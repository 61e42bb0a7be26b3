// crates/server/src/routes/auth.rs
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub has_media_user_token: bool,
    pub storefront: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/auth/status", get(auth_status))
}

/// GET /api/auth/status
pub async fn auth_status(State(state): State<Arc<AppState>>) -> Json<AuthStatus> {
    let config = state.config.snapshot();
    Json(AuthStatus {
        has_media_user_token: config.has_media_user_token(),
        storefront: config.storefront,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::{get_json, post_json, test_app};

    #[tokio::test]
    async fn reflects_configured_token() {
        let (app, _dir) = test_app();
        let (_, json) = get_json(app.clone(), "/api/auth/status").await;
        assert_eq!(json["hasMediaUserToken"], false);
        assert_eq!(json["storefront"], "us");

        post_json(app.clone(), "/api/config", r#"{"media_user_token":"abc"}"#).await;
        let (_, json) = get_json(app, "/api/auth/status").await;
        assert_eq!(json["hasMediaUserToken"], true);
    }
}
