// crates/server/src/routes/download.rs
//! Download session endpoints.
//!
//! - `POST /api/download`                - accept a request, start a worker
//! - `GET  /api/download/{id}`           - JSON snapshot (reliable through any proxy)
//! - `GET  /api/download/progress/{id}`  - SSE stream of progress events

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use amdl_web_core::DownloadJob;
use amdl_web_types::{DownloadRequest, DownloadResponse, DownloadSnapshot};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio_stream::{Stream, StreamExt};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::stream::{progress_events, to_sse};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/download", post(start_download))
        .route("/download/{id}", get(download_snapshot))
        .route("/download/progress/{id}", get(download_progress))
}

/// POST /api/download
///
/// Responds as soon as the session is registered; the worker runs detached.
pub async fn start_download(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DownloadRequest>, JsonRejection>,
) -> ApiResult<Json<DownloadResponse>> {
    let Json(request) = body?;
    let record = state.start_download(DownloadJob::from(request));
    tracing::info!(download_id = %record.id(), "Download accepted");

    Ok(Json(DownloadResponse {
        success: true,
        download_id: record.id().to_string(),
    }))
}

/// GET /api/download/{id}
pub async fn download_snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DownloadSnapshot>> {
    let record = state
        .registry
        .get(&id)
        .ok_or_else(|| ApiError::DownloadNotFound(id.clone()))?;
    let snapshot = record.snapshot();

    Ok(Json(DownloadSnapshot {
        download_id: id,
        status: snapshot.status,
        percent: snapshot.percent,
        message_count: snapshot.message_count,
    }))
}

/// GET /api/download/progress/{id}
///
/// # Events
///
/// | Event name | When emitted                                  |
/// |------------|-----------------------------------------------|
/// | `progress` | Each message appended to the session, in order |
/// | `complete` | Session completed                             |
/// | `error`    | Session failed, or the id is unknown          |
///
/// The stream terminates after `complete` or `error`.
pub async fn download_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let record = state.registry.get(&id);
    if record.is_none() {
        tracing::debug!(download_id = %id, "Progress requested for unknown download");
    }
    let events = progress_events(record, state.poll_interval).map(|event| Ok(to_sse(&event)));

    Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
}
