//! # Laneq Server
//!
//! Runs the in-memory job queue: loads configuration, starts the delay
//! scheduler and worker pool, submits the configured seed jobs, and on
//! Ctrl+C / SIGTERM reports what is left in the pending and dead-letter
//! lanes.

use laneq_config::ConfigLoader;
use laneq_core::{init_logging, LaneqResult};
use laneq_jobs::register_metrics;
use laneq_server::app::QueueRuntime;
use laneq_server::handler::EmailHandler;
use laneq_server::startup::{print_banner, print_report, print_startup_info};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Logging may not be initialised yet.
        eprintln!("Application error [{}]: {}", e.error_code(), e);
        std::process::exit(1);
    }
}

async fn run() -> LaneqResult<()> {
    let config_loader = ConfigLoader::from_default_location()?;
    let config = config_loader.get();

    init_logging(&config.logging)?;
    register_metrics();

    print_banner();
    info!("Starting laneq {}...", env!("CARGO_PKG_VERSION"));
    print_startup_info(config);

    let handler = Arc::new(EmailHandler::from(&config.handler));
    let runtime = QueueRuntime::start(config, handler)?;
    runtime.seed(&config.seed)?;

    shutdown_signal().await;

    let report = runtime.shutdown().await?;
    print_report(&report);

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
