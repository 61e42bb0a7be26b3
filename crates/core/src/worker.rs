// crates/core/src/worker.rs
//! Download worker: drives one [`ProgressRecord`] through the scripted
//! download phases.
//!
//! ```text
//! started -> url-validated -> type-classified -> authenticating
//!         -> (authenticated | auth-failed) -> finishing -> (completed | failed)
//! ```
//!
//! The worker is fire-and-forget. Its only coupling to the rest of the
//! system is the shared record, and it always leaves that record in a
//! terminal status: errors become `failed` plus a diagnostic message, and a
//! drop guard covers panics and cancellation.

use std::sync::Arc;
use std::time::Duration;

use amdl_web_types::{DownloadRequest, DownloadStatus, Quality, Severity};

use crate::classify::{catalog_id, classify_url, MediaKind};
use crate::config::AppConfig;
use crate::error::WorkerError;
use crate::progress::ProgressRecord;
use crate::token::TokenProvider;

/// Name of the command-line downloader the staged command invokes.
pub const CLI_NAME: &str = "amdl";

/// Request-scoped description of what to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub url: String,
    pub quality: Quality,
    pub select_mode: bool,
    pub download_lyrics: bool,
    pub embed_cover: bool,
}

impl From<DownloadRequest> for DownloadJob {
    fn from(req: DownloadRequest) -> Self {
        Self {
            url: req.url.trim().to_string(),
            quality: req.quality,
            select_mode: req.select_mode,
            download_lyrics: req.download_lyrics,
            embed_cover: req.embed_cover,
        }
    }
}

/// Configuration values captured when the request was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    pub save_folder: String,
    pub fallback_token: Option<String>,
}

impl WorkerSettings {
    pub fn from_config(config: &AppConfig, quality: Quality) -> Self {
        Self {
            save_folder: config.save_folder(quality).to_string(),
            fallback_token: config.fallback_authorization_token().map(str::to_string),
        }
    }
}

/// Illustrative waits between the finishing steps.
#[derive(Debug, Clone, Copy)]
pub struct WorkerTiming {
    pub phase_delay: Duration,
}

impl WorkerTiming {
    pub fn immediate() -> Self {
        Self {
            phase_delay: Duration::ZERO,
        }
    }
}

impl Default for WorkerTiming {
    fn default() -> Self {
        Self {
            phase_delay: Duration::from_secs(1),
        }
    }
}

pub struct DownloadWorker {
    record: Arc<ProgressRecord>,
    job: DownloadJob,
    settings: WorkerSettings,
    tokens: Arc<dyn TokenProvider>,
    timing: WorkerTiming,
}

impl DownloadWorker {
    pub fn new(
        record: Arc<ProgressRecord>,
        job: DownloadJob,
        settings: WorkerSettings,
        tokens: Arc<dyn TokenProvider>,
        timing: WorkerTiming,
    ) -> Self {
        Self {
            record,
            job,
            settings,
            tokens,
            timing,
        }
    }

    /// Run the script to completion and return the terminal status reached.
    pub async fn run(self) -> DownloadStatus {
        let _guard = TerminalGuard(Arc::clone(&self.record));
        let id = self.record.id().to_string();
        self.record.set_status(DownloadStatus::Running);
        tracing::info!(download_id = %id, url = %self.job.url, quality = ?self.job.quality, "Download worker started");

        match self.drive().await {
            Ok(()) => {
                self.record.set_status(DownloadStatus::Completed);
                tracing::info!(download_id = %id, "Download worker completed");
            }
            Err(e) => {
                self.record.append_message(e.to_string(), Severity::Error);
                self.record.set_status(DownloadStatus::Failed);
                tracing::warn!(download_id = %id, error = %e, "Download worker failed");
            }
        }
        self.record.status()
    }

    async fn drive(&self) -> Result<(), WorkerError> {
        let record = &self.record;
        let job = &self.job;

        record.append_message(format!("Validating URL: {}", job.url), Severity::Info);
        let kind = classify_url(&job.url).ok_or_else(|| WorkerError::Validation {
            url: job.url.clone(),
        })?;

        record.set_percent(10.0);
        record.append_message(kind.detected_message(), Severity::Info);
        let id_suffix = catalog_id(&job.url)
            .map(|id| format!(" (id {id})"))
            .unwrap_or_default();
        record.append_message(format!("Download type: {kind}{id_suffix}"), Severity::Info);

        record.set_percent(20.0);
        record.append_message(
            format!("Quality set to: {}", job.quality.label()),
            Severity::Info,
        );
        record.append_message(
            format!(
                "Options: select mode {}, lyrics {}, embed cover {}",
                on_off(job.select_mode),
                on_off(job.download_lyrics),
                on_off(job.embed_cover),
            ),
            Severity::Info,
        );

        record.set_percent(25.0);
        record.append_message("Getting authentication token...", Severity::Info);
        self.authenticate().await?;
        record.set_percent(30.0);
        record.append_message("Authentication successful", Severity::Info);

        record.append_message(
            "Web interface download integration in progress",
            Severity::Warning,
        );
        record.append_message("Run this command to download:", Severity::Info);
        record.append_message(format!("   {}", staged_command(kind, job)), Severity::Info);
        record.append_message(
            format!("Files will be saved to: {}", self.settings.save_folder),
            Severity::Info,
        );

        record.set_percent(50.0);
        self.pause().await;
        record.set_percent(80.0);
        self.pause().await;

        record.set_percent(100.0);
        record.append_message(
            "Ready! Copy the command above into a terminal.",
            Severity::Success,
        );
        Ok(())
    }

    async fn authenticate(&self) -> Result<(), WorkerError> {
        match self.tokens.fetch_token().await {
            Ok(_) => Ok(()),
            Err(source) if self.settings.fallback_token.is_some() => {
                tracing::info!(
                    download_id = %self.record.id(),
                    provider = self.tokens.name(),
                    error = %source,
                    "Token acquisition failed, using configured authorization token"
                );
                self.record
                    .append_message("Using provided authorization token", Severity::Info);
                Ok(())
            }
            Err(source) => Err(WorkerError::Authentication { source }),
        }
    }

    async fn pause(&self) {
        if !self.timing.phase_delay.is_zero() {
            tokio::time::sleep(self.timing.phase_delay).await;
        }
    }
}

/// Command line a user would run for this job.
pub fn staged_command(kind: MediaKind, job: &DownloadJob) -> String {
    let mut parts = vec![CLI_NAME];
    if kind == MediaKind::Song {
        parts.push("--song");
    }
    match job.quality {
        Quality::Atmos => parts.push("--atmos"),
        Quality::Aac => parts.push("--aac"),
        Quality::Alac => {}
    }
    if job.select_mode {
        parts.push("--select");
    }
    parts.push(&job.url);
    if kind == MediaKind::Artist {
        parts.push("--all-album");
    }
    parts.join(" ")
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// Marks the record failed if the worker goes away before a terminal status.
struct TerminalGuard(Arc<ProgressRecord>);

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if !self.0.status().is_terminal() {
            tracing::error!(download_id = %self.0.id(), "Download worker stopped before finishing");
            self.0
                .append_message("Download worker stopped unexpectedly", Severity::Error);
            self.0.set_status(DownloadStatus::Failed);
        }
    }
}
