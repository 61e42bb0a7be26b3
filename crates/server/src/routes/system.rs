// crates/server/src/routes/system.rs
//! Host descriptor for the UI footer.

use std::sync::Arc;

use amdl_web_types::SystemInfo;
use axum::{routing::get, Json, Router};
use sysinfo::System;

use crate::state::AppState;

fn system_info() -> SystemInfo {
    let os = format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH);
    let version = env!("CARGO_PKG_VERSION").to_string();
    SystemInfo {
        runtime: format!("amdl-web {version} on {os}"),
        os,
        version,
        os_name: System::long_os_version(),
        host_name: System::host_name(),
    }
}

/// GET /api/system/info
pub async fn system_info_handler() -> Json<SystemInfo> {
    Json(system_info())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/system/info", get(system_info_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_json, test_app};
    use axum::http::StatusCode;

    #[test]
    fn os_is_os_slash_arch() {
        let info = system_info();
        assert_eq!(
            info.os,
            format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)
        );
        assert!(info.runtime.ends_with(&info.os));
    }

    #[tokio::test]
    async fn endpoint_returns_descriptor() {
        let (app, _dir) = test_app();
        let (status, json) = get_json(app, "/api/system/info").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["os"].as_str().unwrap().contains('/'));
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
