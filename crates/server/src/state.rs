// crates/server/src/state.rs
//! Application state for the Axum server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use amdl_web_core::{
    AppConfig, ConfigStore, DownloadJob, DownloadWorker, ProbeSettings, ProgressRecord,
    SessionRegistry, StaticTokenProvider, TokenProvider, WorkerSettings, WorkerTiming,
};
use amdl_web_types::DownloadStatus;
use tokio::task::JoinHandle;

use crate::metrics::{record_download_finished, record_download_started};

/// Default interval between progress polls on an open stream.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Every download session accepted since startup.
    pub registry: Arc<SessionRegistry>,
    /// `config.yaml`, loaded at startup and rewritten by `POST /api/config`.
    pub config: Arc<ConfigStore>,
    /// Where workers get their catalog token.
    pub tokens: Arc<dyn TokenProvider>,
    /// Tools directory and wrapper address for dependency probes.
    pub probe: ProbeSettings,
    /// How often an open progress stream re-reads its record.
    pub poll_interval: Duration,
    /// Delays between the worker's finishing steps.
    pub timing: WorkerTiming,
}

impl AppState {
    pub fn new(config: ConfigStore, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            start_time: Instant::now(),
            registry: Arc::new(SessionRegistry::new()),
            config: Arc::new(config),
            tokens,
            probe: ProbeSettings::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timing: WorkerTiming::default(),
        }
    }

    /// In-memory defaults, a token, no delays and a fast poll; for tests.
    pub fn for_tests(config_path: impl Into<PathBuf>) -> Self {
        let mut state = Self::new(
            ConfigStore::with_config(config_path, AppConfig::default()),
            Arc::new(StaticTokenProvider::new(Some("test-token".into()))),
        );
        state.poll_interval = Duration::from_millis(10);
        state.timing = WorkerTiming::immediate();
        state
    }

    pub fn with_probe(mut self, probe: ProbeSettings) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timing(mut self, timing: WorkerTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Register a new session and start its worker in the background.
    ///
    /// Returns as soon as the record exists; the worker is detached.
    pub fn start_download(&self, job: DownloadJob) -> Arc<ProgressRecord> {
        let record = self.registry.create_session();
        let settings = WorkerSettings::from_config(&self.config.snapshot(), job.quality);
        let worker = DownloadWorker::new(
            Arc::clone(&record),
            job,
            settings,
            Arc::clone(&self.tokens),
            self.timing,
        );

        record_download_started();
        let handle = tokio::spawn(worker.run());
        let watched = Arc::clone(&record);
        tokio::spawn(async move {
            let status = finished_status(handle, &watched).await;
            record_download_finished(status);
        });
        record
    }

    /// Periodically drop sessions that finished more than `ttl` ago.
    pub fn spawn_session_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(&self.registry);
        let period = (ttl / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let removed = registry.evict_finished(ttl);
                if removed > 0 {
                    tracing::info!(removed, remaining = registry.len(), "Evicted finished download sessions");
                }
            }
        })
    }
}

/// Terminal status of a worker task, read back from its record when the task
/// panicked or was cancelled.
async fn finished_status(
    handle: JoinHandle<DownloadStatus>,
    record: &ProgressRecord,
) -> DownloadStatus {
    match handle.await {
        Ok(status) => status,
        Err(e) => {
            tracing::error!(download_id = %record.id(), error = %e, "Download worker task ended abnormally");
            record.status()
        }
    }
}
