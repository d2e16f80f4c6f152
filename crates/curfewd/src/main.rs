//! curfewd - The curfew background service
//!
//! This is the main entry point for the curfew service.
//! It wires together all the components:
//! - Logging (file, plus stderr unless silenced)
//! - Configuration source selection
//! - X11 window host
//! - Guard loop on its own thread
//! - Signal handling and shutdown

use anyhow::{Context, Result};
use clap::Parser;
use curfew_config::{ConfigSource, DocumentLoader};
use curfew_core::{DEFAULT_NAVIGATE_TO, GuardLoop, GuardSettings, StopFlag};
use curfew_host_api::WindowHost;
use curfew_host_linux::LinuxHost;
use curfew_util::{CURFEW_CONFIG_ENV, CURFEW_CONFIG_URL_ENV, default_config_path, default_log_file};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// curfewd - Screen-time restriction guard
#[derive(Parser, Debug)]
#[command(name = "curfewd")]
#[command(about = "Screen-time restriction guard", long_about = None)]
struct Args {
    /// Configuration file path (JSON, or TOML for .toml files)
    #[arg(short, long, env = CURFEW_CONFIG_ENV, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Remote configuration URL; takes precedence over --config and is reloaded periodically
    #[arg(short = 'u', long, env = CURFEW_CONFIG_URL_ENV)]
    config_url: Option<String>,

    /// Seconds between reloads of a remote configuration
    #[arg(long, default_value_t = 1200, value_parser = clap::value_parser!(u64).range(1..))]
    refresh_interval: u64,

    /// Seconds between polls while restricted
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u64).range(1..))]
    active_interval: u64,

    /// Seconds between polls while unrestricted
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    idle_interval: u64,

    /// Address force-navigated browsers are sent to
    #[arg(long, default_value = DEFAULT_NAVIGATE_TO)]
    navigate_to: String,

    /// Log file path (default: ~/.local/state/curfew/curfew.log)
    #[arg(long, default_value_os_t = default_log_file())]
    log_file: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log to the file only, not to stderr
    #[arg(short, long)]
    silent: bool,

    /// Keep running on SIGTERM and SIGINT (SIGHUP still stops the guard)
    #[arg(long)]
    ignore_interrupts: bool,
}

impl Args {
    fn settings(&self) -> GuardSettings {
        GuardSettings {
            active_interval: Duration::from_secs(self.active_interval),
            idle_interval: Duration::from_secs(self.idle_interval),
            refresh_interval: Duration::from_secs(self.refresh_interval),
            navigate_to: self.navigate_to.clone(),
            ..GuardSettings::default()
        }
    }

    /// The URL if one was given, else the file if it exists
    fn source(&self) -> Option<ConfigSource> {
        if let Some(url) = self.config_url.as_ref().filter(|url| !url.is_empty()) {
            return Some(ConfigSource::Url(url.clone()));
        }

        if self.config.exists() {
            Some(ConfigSource::File(self.config.clone()))
        } else {
            warn!(config_path = %self.config.display(), "Configuration file not found");
            None
        }
    }
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {:?}", dir))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {:?}", path))
}

/// Install the subscriber. A log file that cannot be opened is reported
/// back instead of failing startup.
fn init_logging(args: &Args) -> Option<anyhow::Error> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let (file_layer, file_error) = match open_log_file(&args.log_file) {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    // Without a file, stderr is the only sink left
    let stderr_layer = (!args.silent || file_layer.is_none())
        .then(|| fmt::layer().with_writer(std::io::stderr).with_target(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    file_error
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(e) = init_logging(&args) {
        warn!(error = %format!("{:#}", e), "Logging to stderr only");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %args.log_file.display(),
        "curfewd starting"
    );

    if curfew_util::is_mock_time_active() {
        warn!(now = %curfew_util::format_datetime_full(&curfew_util::now()), "Mock time is active");
    }

    let host = LinuxHost::connect().context("Failed to connect to the X display")?;
    info!(capabilities = ?host.capabilities(), "Window host ready");

    let source = args.source();
    let settings = args.settings();
    let stop = StopFlag::new();
    let (done_tx, mut done_rx) = oneshot::channel::<()>();

    // The guard performs blocking I/O (X11 requests, HTTP fetches), so it
    // gets an OS thread outside the runtime
    let guard_stop = stop.clone();
    let guard_thread = std::thread::Builder::new()
        .name("curfew-guard".into())
        .spawn(move || {
            let mut guard = GuardLoop::new(host, DocumentLoader::new(), source, settings)
                .with_stop_flag(guard_stop);
            guard.run();
            let _ = done_tx.send(());
        })
        .context("Failed to spawn guard thread")?;

    let mut sigterm = signal(SignalKind::terminate())
        .context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt())
        .context("Failed to create SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup())
        .context("Failed to create SIGHUP handler")?;

    info!(ignore_interrupts = args.ignore_interrupts, "Service running");

    loop {
        tokio::select! {
            // Signal: SIGHUP - session is ending, always stop
            _ = sighup.recv() => {
                info!("Received SIGHUP, shutting down");
                break;
            }

            _ = sigterm.recv() => {
                if args.ignore_interrupts {
                    warn!("Received SIGTERM, ignoring");
                } else {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
            }

            _ = sigint.recv() => {
                if args.ignore_interrupts {
                    warn!("Received SIGINT, ignoring");
                } else {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
            }

            // Guard thread ended on its own (it only does so by panicking)
            _ = &mut done_rx => {
                error!("Guard thread exited unexpectedly");
                break;
            }
        }
    }

    info!("Shutting down curfewd");
    stop.stop();

    match tokio::task::spawn_blocking(move || guard_thread.join()).await {
        Ok(Ok(())) => info!("Guard stopped"),
        Ok(Err(_)) => error!("Guard thread panicked"),
        Err(e) => error!(error = %e, "Failed to join guard thread"),
    }

    info!("curfewd stopped");
    Ok(())
}
