// crates/core/src/install.rs
//! Automated installation of external tools via the system package manager.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use crate::error::DependencyError;

/// Per-step limit; package managers can be slow but must not hang forever.
const STEP_TIMEOUT: Duration = Duration::from_secs(600);

const GPAC_DOWNLOAD: &str = "https://gpac.io/downloads/gpac-nightly-builds/";
const BENTO4_DOWNLOAD: &str = "https://www.bento4.com/downloads/";
const FFMPEG_DOWNLOAD: &str = "https://ffmpeg.org/download.html";

/// One package-manager invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStep {
    pub program: &'static str,
    pub args: Vec<&'static str>,
}

impl InstallStep {
    fn new(program: &'static str, args: &[&'static str]) -> Self {
        Self {
            program,
            args: args.to_vec(),
        }
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

fn manual(tool: &str, url: &str) -> DependencyError {
    DependencyError::ManualInstall(format!(
        "please download {tool} from {url} and add to PATH"
    ))
}

/// Steps that install `name` on `os` (values of `std::env::consts::OS`).
pub fn install_plan(name: &str, os: &str) -> Result<Vec<InstallStep>, DependencyError> {
    let apt = |package: &'static str| {
        vec![
            InstallStep::new("apt-get", &["update"]),
            InstallStep::new("apt-get", &["install", "-y", package]),
        ]
    };
    let brew = |package: &'static str| vec![InstallStep::new("brew", &["install", package])];
    let unsupported = || DependencyError::Unsupported(os.to_string());

    match name {
        "mp4box" => match os {
            "linux" => Ok(apt("gpac")),
            "macos" => Ok(brew("gpac")),
            "windows" => Err(manual("MP4Box", GPAC_DOWNLOAD)),
            _ => Err(unsupported()),
        },
        "mp4decrypt" => match os {
            "linux" | "macos" | "windows" => Err(manual("mp4decrypt", BENTO4_DOWNLOAD)),
            _ => Err(unsupported()),
        },
        "ffmpeg" => match os {
            "linux" => Ok(apt("ffmpeg")),
            "macos" => Ok(brew("ffmpeg")),
            "windows" => Err(manual("FFmpeg", FFMPEG_DOWNLOAD)),
            _ => Err(unsupported()),
        },
        other => Err(DependencyError::Unknown(other.to_string())),
    }
}

/// Install `name` on the current OS, stopping at the first failing step.
pub async fn install(name: &str) -> Result<(), DependencyError> {
    let steps = install_plan(name, std::env::consts::OS)?;
    for step in &steps {
        run_step(step).await?;
    }
    tracing::info!(dependency = name, steps = steps.len(), "Dependency installed");
    Ok(())
}

async fn run_step(step: &InstallStep) -> Result<(), DependencyError> {
    let command = step.to_string();
    tracing::info!(%command, "Running install step");

    let child = tokio::process::Command::new(step.program)
        .args(&step.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| DependencyError::Spawn {
            command: command.clone(),
            source,
        })?;

    let output = tokio::time::timeout(STEP_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| DependencyError::TimedOut {
            command: command.clone(),
            secs: STEP_TIMEOUT.as_secs(),
        })?
        .map_err(|source| DependencyError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if stderr.trim().is_empty() {
            stderr = String::from_utf8_lossy(&output.stdout).into_owned();
        }
        tracing::warn!(%command, status = %output.status, %stderr, "Install step failed");
        return Err(DependencyError::CommandFailed {
            command,
            status: output.status.to_string(),
            stderr,
        });
    }
    Ok(())
}
