//! Startup and shutdown output.

use crate::app::QueueReport;
use laneq_config::AppConfig;
use tracing::{info, warn};

/// Logs the startup banner.
pub fn print_banner() {
    info!(r#"
    __
   / /___ _____  ___  ____ _
  / / __ `/ __ \/ _ \/ __ `/
 / / /_/ / / / /  __/ /_/ /
/_/\__,_/_/ /_/\___/\__, /
                      /_/
    "#);
}

/// Logs the effective queue settings.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("Environment:   {}", config.app.environment);
    info!("Workers:       {}", config.jobs.worker.concurrency);
    info!("Idle wait:     {} ms", config.jobs.worker.idle_interval_ms);
    info!("Poll interval: {} ms", config.jobs.scheduler.poll_interval_ms);
    info!(
        "Retry:         {:?}, unit {} ms, default max retries {}",
        config.jobs.retry.strategy, config.jobs.retry.unit_ms, config.jobs.retry.default_max_retries
    );
    info!("{}", separator);
}

/// Logs the jobs left in the queue after shutdown.
pub fn print_report(report: &QueueReport) {
    info!(
        pending = report.pending.len(),
        dead_letter = report.dead_letter.len(),
        delayed = report.delayed,
        "Queue state at shutdown"
    );

    for line in &report.pending {
        info!("Pending:     {}", line);
    }
    for line in &report.dead_letter {
        warn!("Dead letter: {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::JobLine;

    #[test]
    fn test_print_banner_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_banner();
    }

    #[test]
    fn test_print_startup_info_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_startup_info(&AppConfig::default());
    }

    #[test]
    fn test_print_report_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_report(&QueueReport {
            pending: Vec::new(),
            dead_letter: vec![JobLine {
                id: "x".to_string(),
                to: None,
                priority: "low".to_string(),
                retry_count: 4,
                max_retries: 3,
            }],
            delayed: 0,
        });
    }
}
