// crates/server/src/main.rs
//! amdl-web server binary.
//!
//! Loads `config.yaml`, installs logging and metrics, then serves the API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use amdl_web_core::{ConfigStore, ProbeSettings, StaticTokenProvider, WorkerTiming};
use amdl_web_observability::{init_tracing, LogFormat, LogOptions};
use amdl_web_server::{create_app, init_metrics, AppState};
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "amdl-web")]
#[command(author, version, about = "Web control plane for the amdl downloader", long_about = None)]
struct Cli {
    /// Interface to bind
    #[arg(long, env = "AMDL_WEB_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "AMDL_WEB_PORT", default_value_t = 8080)]
    port: u16,

    /// Path to the YAML config file
    #[arg(short, long, env = "AMDL_WEB_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Directory searched for tool binaries before PATH
    #[arg(long, env = "AMDL_WEB_TOOLS_DIR", default_value = ".")]
    tools_dir: PathBuf,

    /// Address of the decryption wrapper service
    #[arg(long, env = "AMDL_WEB_WRAPPER_ADDR", default_value = "127.0.0.1:10020")]
    wrapper_addr: String,

    /// Progress stream poll interval in milliseconds
    #[arg(long, default_value_t = 500)]
    poll_interval_ms: u64,

    /// Delay between the worker's finishing steps in milliseconds
    #[arg(long, default_value_t = 1000)]
    phase_delay_ms: u64,

    /// Drop finished sessions after this many seconds (kept forever if unset)
    #[arg(long, env = "AMDL_WEB_SESSION_TTL_SECS")]
    session_ttl_secs: Option<u64>,

    /// Console log format: compact or json
    #[arg(long, env = "AMDL_WEB_LOG_FORMAT", default_value = "compact")]
    log_format: LogFormat,

    /// Also write daily-rolling log files here
    #[arg(long, env = "AMDL_WEB_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Catalog access token handed to download workers
    #[arg(long, env = "AMDL_WEB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_tracing(&LogOptions {
        format: cli.log_format,
        log_dir: cli.log_dir.clone(),
    })?;

    init_metrics();

    let config = ConfigStore::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let tokens = Arc::new(StaticTokenProvider::new(cli.token.clone()));

    let state = AppState::new(config, tokens)
        .with_probe(ProbeSettings {
            tools_dir: cli.tools_dir.clone(),
            wrapper_addr: cli.wrapper_addr.clone(),
        })
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms.max(1)))
        .with_timing(WorkerTiming {
            phase_delay: Duration::from_millis(cli.phase_delay_ms),
        });
    let state = Arc::new(state);

    if let Some(ttl) = cli.session_ttl_secs {
        state.spawn_session_sweeper(Duration::from_secs(ttl));
        tracing::info!(ttl_secs = ttl, "Session eviction enabled");
    }

    let app = create_app(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cli.host, cli.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(
        %addr,
        config = %cli.config.display(),
        tools_dir = %cli.tools_dir.display(),
        "amdl-web v{} listening",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("amdl-web v{} ready at http://{addr}", env!("CARGO_PKG_VERSION"));

    axum::serve(listener, app).await?;
    Ok(())
}
