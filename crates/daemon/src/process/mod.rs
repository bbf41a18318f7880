pub mod utils;

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http_server;
use crate::{ServiceConfig, ServiceState};

/// How long in-flight requests get to drain after shutdown is signalled
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);
const LOG_FILE_PREFIX: &str = "feedback.log";

/// Exit codes for the fatal startup/shutdown paths
const EXIT_SIGNALS: i32 = 2;
const EXIT_STATE: i32 = 3;
const EXIT_DRAIN: i32 = 4;

/// Keeps a running service reachable after `start_service` returns.
///
/// Dropping the handle does not stop the server.
pub struct ShutdownHandle {
    signals: JoinHandle<()>,
    server: JoinHandle<()>,
    trigger: watch::Sender<()>,
}

impl ShutdownHandle {
    /// Wait for a signal (or [`ShutdownHandle::shutdown`]) and for the
    ///  server to drain.
    pub async fn wait(self) {
        let _ = self.signals.await;

        if tokio::time::timeout(DRAIN_TIMEOUT, self.server).await.is_err() {
            tracing::error!(
                timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "server did not drain in time"
            );
            std::process::exit(EXIT_DRAIN);
        }
    }

    pub fn shutdown(&self) {
        let _ = self.trigger.send(());
    }
}

fn env_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Compact stdout logging, plus a daily rolling file when `log_dir` is
///  set. The returned guards flush the writers and must outlive the service.
fn init_logging(config: &ServiceConfig) -> Vec<WorkerGuard> {
    let (stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let mut guards = vec![stdout_guard];

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout)
        .with_filter(env_filter(config.log_level));

    let file_layer = config.log_dir.as_ref().and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Warning: cannot create log directory {}: {e}", dir.display());
            return None;
        }

        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
        guards.push(guard);

        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(env_filter(config.log_level)),
        )
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

/// Build state and spawn the HTTP server. Startup failures are fatal.
pub async fn start_service(config: &ServiceConfig) -> (ServiceState, ShutdownHandle) {
    let (signals, trigger, shutdown_rx) = match utils::graceful_shutdown_blocker() {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!(error = %e, "failed to install signal handlers");
            std::process::exit(EXIT_SIGNALS);
        }
    };

    let state = match ServiceState::from_config(config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "failed to set up service state");
            std::process::exit(EXIT_STATE);
        }
    };

    let http_config = http_server::Config::from(config);
    let server_state = state.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = http_server::run(http_config, server_state, shutdown_rx).await {
            tracing::error!(error = %e, "HTTP server stopped with an error");
        }
    });

    tracing::info!(addr = %config.listen_addr, "feedback service running");

    let handle = ShutdownHandle {
        signals,
        server,
        trigger,
    };
    (state, handle)
}

/// Run the service in the foreground until a shutdown signal arrives
pub async fn spawn_service(config: &ServiceConfig) {
    let _guards = init_logging(config);
    let (_, handle) = start_service(config).await;
    handle.wait().await;
}
