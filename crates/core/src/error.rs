// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the session registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Session already exists: {id}")]
    Duplicate { id: String },
}

/// Errors that end a download worker. They never escape the worker: each one
/// is turned into a `failed` status plus a diagnostic message on the record.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid URL format: {url}")]
    Validation { url: String },

    #[error("Failed to get authentication token: {source}")]
    Authentication {
        #[source]
        source: TokenError,
    },
}

/// Errors from the token-acquisition collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("no token source configured")]
    Unavailable,
}

/// Errors from dependency probing and installation.
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("unknown dependency: {0}")]
    Unknown(String),

    #[error("unsupported OS: {0}")]
    Unsupported(String),

    /// No automated path exists; the message tells the operator what to do.
    #[error("{0}")]
    ManualInstall(String),

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {secs}s")]
    TimedOut { command: String, secs: u64 },
}

/// Errors reading or writing the YAML configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to encode config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
