// crates/core/src/deps.rs
//! External tool detection.
//!
//! Each tool is looked up in the configured tools directory first and on
//! `PATH` second, then asked for `--version` under a short timeout so a hung
//! binary cannot stall the dependency check.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use amdl_web_types::DependencyStatus;

/// Timeout for each `--version` subprocess.
const VERSION_TIMEOUT: Duration = Duration::from_secs(3);

/// Timeout for the wrapper TCP reachability check.
const WRAPPER_TIMEOUT: Duration = Duration::from_secs(2);

const MAX_VERSION_LEN: usize = 50;

/// ffmpeg shared libraries recognised in the tools directory.
const FFMPEG_LIBS: [&str; 4] = ["avcodec", "avformat", "avutil", "swresample"];
const MIN_FFMPEG_LIBS: usize = 3;

/// A command-line tool the downloader shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tool {
    /// Key in the dependency report.
    pub name: &'static str,
    /// Executable name without extension.
    pub binary: &'static str,
}

pub const MP4BOX: Tool = Tool {
    name: "mp4box",
    binary: "MP4Box",
};
pub const MP4DECRYPT: Tool = Tool {
    name: "mp4decrypt",
    binary: "mp4decrypt",
};
pub const FFMPEG: Tool = Tool {
    name: "ffmpeg",
    binary: "ffmpeg",
};

pub const WRAPPER: &str = "wrapper";

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub tools_dir: PathBuf,
    pub wrapper_addr: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            tools_dir: PathBuf::from("."),
            wrapper_addr: "127.0.0.1:10020".to_string(),
        }
    }
}

/// Resolve `tool`: tools directory first, then `PATH`.
pub fn locate(tool: Tool, tools_dir: &Path) -> Option<PathBuf> {
    let local = tools_dir.join(format!("{}{}", tool.binary, std::env::consts::EXE_SUFFIX));
    if local.is_file() {
        return Some(local);
    }
    which::which(tool.binary).ok()
}

/// Blocking probe of one executable tool.
pub fn probe_tool(tool: Tool, tools_dir: &Path) -> DependencyStatus {
    let Some(path) = locate(tool, tools_dir) else {
        if tool == FFMPEG {
            return probe_ffmpeg_libraries(tools_dir);
        }
        return DependencyStatus::missing();
    };

    let version = version_line(&path);
    tracing::debug!(tool = tool.name, path = %path.display(), version = ?version, "Tool found");
    DependencyStatus {
        installed: true,
        version,
        path: Some(path.display().to_string()),
    }
}

/// ffmpeg shipped as shared libraries without the CLI still counts.
fn probe_ffmpeg_libraries(tools_dir: &Path) -> DependencyStatus {
    let libs = ffmpeg_libraries(tools_dir);
    if libs.len() < MIN_FFMPEG_LIBS {
        return DependencyStatus::missing();
    }
    DependencyStatus {
        installed: true,
        version: Some("shared libraries only".to_string()),
        path: Some(libs.join(", ")),
    }
}

fn ffmpeg_libraries(tools_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(tools_dir) else {
        return Vec::new();
    };
    let mut found: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| is_ffmpeg_library(name))
        .collect();
    found.sort();
    found
}

fn is_ffmpeg_library(file_name: &str) -> bool {
    let is_shared = [".dll", ".so", ".dylib"]
        .iter()
        .any(|ext| file_name.ends_with(ext) || file_name.contains(&format!("{ext}.")));
    let stem = file_name.strip_prefix("lib").unwrap_or(file_name);
    is_shared
        && FFMPEG_LIBS
            .iter()
            .any(|lib| stem.starts_with(&format!("{lib}-")) || stem.starts_with(&format!("{lib}.")))
}

/// First line of `<path> --version` (stdout then stderr), truncated.
///
/// A tool that exits non-zero reports no version.
fn version_line(path: &Path) -> Option<String> {
    let output = run_with_timeout(Command::new(path).arg("--version"))?;
    if !output.status.success() {
        tracing::debug!(path = %path.display(), status = %output.status, "--version rejected");
        return None;
    }
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    let first = combined.lines().next()?.trim();
    (!first.is_empty()).then(|| truncate_version(first))
}

/// Run a command with a timeout, returning None if it times out or fails to start.
fn run_with_timeout(cmd: &mut Command) -> Option<Output> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .ok()?;

    let deadline = Instant::now() + VERSION_TIMEOUT;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return child.wait_with_output().ok(),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!("Version probe timed out");
                    return None;
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(_) => return None,
        }
    }
}

/// Cap a version string at 50 characters, marking the cut with `...`.
pub fn truncate_version(version: &str) -> String {
    if version.chars().count() <= MAX_VERSION_LEN {
        return version.to_string();
    }
    let mut out: String = version.chars().take(MAX_VERSION_LEN).collect();
    out.push_str("...");
    out
}

/// The wrapper is "installed" when its port accepts a connection.
pub async fn probe_wrapper(addr: &str) -> DependencyStatus {
    match tokio::time::timeout(WRAPPER_TIMEOUT, tokio::net::TcpStream::connect(addr)).await {
        Ok(Ok(_)) => DependencyStatus {
            installed: true,
            version: Some("running".to_string()),
            path: None,
        },
        Ok(Err(e)) => {
            tracing::debug!(addr, error = %e, "Wrapper not reachable");
            DependencyStatus::missing()
        }
        Err(_) => {
            tracing::debug!(addr, "Wrapper connect timed out");
            DependencyStatus::missing()
        }
    }
}

async fn probe_tool_blocking(tool: Tool, tools_dir: PathBuf) -> DependencyStatus {
    tokio::task::spawn_blocking(move || probe_tool(tool, &tools_dir))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(tool = tool.name, error = %e, "Probe task failed");
            DependencyStatus::missing()
        })
}

/// Probe every dependency concurrently.
pub async fn check_all(settings: &ProbeSettings) -> BTreeMap<String, DependencyStatus> {
    let dir = &settings.tools_dir;
    let (mp4box, mp4decrypt, ffmpeg, wrapper) = tokio::join!(
        probe_tool_blocking(MP4BOX, dir.clone()),
        probe_tool_blocking(MP4DECRYPT, dir.clone()),
        probe_tool_blocking(FFMPEG, dir.clone()),
        probe_wrapper(&settings.wrapper_addr),
    );

    BTreeMap::from([
        (MP4BOX.name.to_string(), mp4box),
        (MP4DECRYPT.name.to_string(), mp4decrypt),
        (FFMPEG.name.to_string(), ffmpeg),
        (WRAPPER.to_string(), wrapper),
    ])
}
