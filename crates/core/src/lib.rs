// crates/core/src/lib.rs
pub mod classify;
pub mod config;
pub mod deps;
pub mod error;
pub mod install;
pub mod progress;
pub mod registry;
pub mod session_id;
pub mod token;
pub mod worker;

pub use classify::{catalog_id, classify_url, MediaKind};
pub use config::{AppConfig, ConfigStore, ConfigUpdate};
pub use deps::{check_all, ProbeSettings};
pub use error::*;
pub use progress::{ProgressDelta, ProgressMessage, ProgressRecord, ProgressSnapshot};
pub use registry::SessionRegistry;
pub use session_id::SessionIdGenerator;
pub use token::{StaticTokenProvider, TokenProvider};
pub use worker::{DownloadJob, DownloadWorker, WorkerSettings, WorkerTiming};
