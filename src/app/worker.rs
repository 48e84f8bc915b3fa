//! Background payroll scheduler.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::{AppError, LedgerError, ProcessPayrollRequest};

use super::payroll::PayrollService;

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Time between payroll runs
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(3600),
        }
    }
}

/// Periodically pays every employee whose salary is due
pub struct PayrollScheduler {
    service: Arc<PayrollService>,
    config: SchedulerConfig,
    shutdown_rx: watch::Receiver<bool>,
}

impl PayrollScheduler {
    #[must_use]
    pub fn new(
        service: Arc<PayrollService>,
        config: SchedulerConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            service,
            config,
            shutdown_rx,
        }
    }

    pub async fn run(mut self) {
        if !self.config.enabled {
            info!("Payroll scheduler disabled");
            return;
        }
        info!(interval_secs = self.config.interval.as_secs(), "Payroll scheduler started");

        let mut ticker = tokio::time::interval(self.config.interval);
        // The first tick fires immediately; skip it so startup does not pay anyone.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_once().await,
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("Payroll scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Execute one payroll run, logging rather than propagating failures
    pub async fn run_once(&self) {
        match self
            .service
            .process_payroll(&ProcessPayrollRequest::default(), Utc::now())
            .await
        {
            Ok(result) if result.processed.is_empty() => {
                debug!(skipped = result.skipped.len(), "Scheduled payroll: nothing due");
            }
            Ok(result) => {
                info!(
                    processed = result.processed.len(),
                    skipped = result.skipped.len(),
                    "Scheduled payroll run complete"
                );
            }
            Err(AppError::Ledger(LedgerError::Paused)) => {
                warn!("Scheduled payroll skipped: ledger is paused");
            }
            Err(e) => {
                error!(error = ?e, "Scheduled payroll run failed");
            }
        }
    }
}

/// Spawn the scheduler; send `true` on the returned channel to stop it.
pub fn spawn_scheduler(
    service: Arc<PayrollService>,
    config: SchedulerConfig,
) -> (JoinHandle<()>, watch::Sender<bool>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = PayrollScheduler::new(service, config, shutdown_rx);
    let handle = tokio::spawn(scheduler.run());
    (handle, shutdown_tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_default_is_disabled() {
        let config = SchedulerConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.interval, Duration::from_secs(3600));
    }
}
