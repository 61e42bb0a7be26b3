// crates/server/src/routes/wrapper.rs
//! The decryption wrapper runs outside this process; this endpoint only
//! reports whether it is up and how to start it.

use std::sync::Arc;

use amdl_web_core::deps::probe_wrapper;
use amdl_web_types::ActionResponse;
use axum::{extract::State, routing::post, Json, Router};

use crate::state::AppState;

pub const WRAPPER_GUIDE: &str =
    "Please start the wrapper service manually. See: https://github.com/zhaarey/wrapper";

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/wrapper/start", post(start_wrapper))
}

/// POST /api/wrapper/start
pub async fn start_wrapper(State(state): State<Arc<AppState>>) -> Json<ActionResponse> {
    let status = probe_wrapper(&state.probe.wrapper_addr).await;
    Json(if status.installed {
        ActionResponse::ok_with_message("Wrapper service is already running")
    } else {
        ActionResponse::failed(WRAPPER_GUIDE)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{app_with, post_json};
    use amdl_web_core::ProbeSettings;

    fn state_for(addr: String) -> AppState {
        AppState::for_tests("config.yaml").with_probe(ProbeSettings {
            tools_dir: ".".into(),
            wrapper_addr: addr,
        })
    }

    #[tokio::test]
    async fn running_wrapper_is_success() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let (_, json) = post_json(app_with(state_for(addr)), "/api/wrapper/start", "").await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Wrapper service is already running");
    }

    #[tokio::test]
    async fn stopped_wrapper_returns_guidance() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let (_, json) = post_json(app_with(state_for(addr)), "/api/wrapper/start", "").await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], WRAPPER_GUIDE);
    }
}
