// Maintenance Scheduler
// Server-owned unresponsive-entry sweep plus periodic store housekeeping

use crate::application::authz::require_admin;
use crate::application::queue_state::QueueStateService;
use crate::application::shutdown::ShutdownToken;
use crate::domain::Session;
use crate::error::Result;
use crate::port::{Maintenance, MaintenanceConfig, MaintenanceReport, MaintenanceStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Maintenance scheduler
///
/// Two timers in one background task:
/// - sweep: deletes called entries past their response deadline
/// - housekeeping: retention GC of finished entries, VACUUM when large
pub struct MaintenanceScheduler {
    queue_state: Arc<QueueStateService>,
    maintenance: Arc<dyn Maintenance>,
    config: MaintenanceConfig,
    sweep_interval: Duration,
    housekeeping_interval: Duration,
}

impl MaintenanceScheduler {
    /// Create a new maintenance scheduler
    ///
    /// # Arguments
    /// * `queue_state` - Sweep entry point (publishes delete events)
    /// * `maintenance` - Store maintenance implementation
    /// * `config` - Retention and size thresholds
    /// * `sweep_interval` - How often to sweep unresponsive entries
    /// * `housekeeping_interval` - How often to run GC/VACUUM
    pub fn new(
        queue_state: Arc<QueueStateService>,
        maintenance: Arc<dyn Maintenance>,
        config: MaintenanceConfig,
        sweep_interval: Duration,
        housekeeping_interval: Duration,
    ) -> Self {
        Self {
            queue_state,
            maintenance,
            config,
            sweep_interval,
            housekeeping_interval,
        }
    }

    /// Run both loops until shutdown (spawn with tokio::spawn)
    pub async fn run(self: Arc<Self>, mut shutdown: ShutdownToken) {
        info!(
            sweep_interval_secs = self.sweep_interval.as_secs(),
            housekeeping_interval_secs = self.housekeeping_interval.as_secs(),
            retention_days = self.config.finished_entry_retention_days,
            "Maintenance scheduler started"
        );

        let mut sweep_tick = interval(self.sweep_interval);
        sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut housekeeping_tick = interval(self.housekeeping_interval);
        housekeeping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    info!("Maintenance scheduler stopping");
                    break;
                }
                _ = sweep_tick.tick() => {
                    if let Err(e) = self.queue_state.sweep_unresponsive().await {
                        error!(error = ?e, "Scheduled sweep failed");
                    }
                }
                _ = housekeeping_tick.tick() => {
                    info!("Running scheduled housekeeping...");
                    match self.maintenance.run_full_maintenance(&self.config, false).await {
                        Ok(report) => {
                            info!(
                                entries_deleted = report.entries_deleted,
                                vacuum_run = report.vacuum_run,
                                db_size_mb = report.after.db_size_mb,
                                "Scheduled housekeeping completed"
                            );
                        }
                        Err(e) => {
                            error!(error = ?e, "Scheduled housekeeping failed");
                        }
                    }
                }
            }
        }
    }

    /// Run housekeeping immediately (admin trigger)
    pub async fn run_now(&self, session: &Session, force_vacuum: bool) -> Result<MaintenanceReport> {
        let admin = require_admin(session)?;
        info!(by = %admin.user_id, force_vacuum, "Running manual housekeeping...");
        self.maintenance
            .run_full_maintenance(&self.config, force_vacuum)
            .await
    }

    /// Current store statistics (admin only)
    pub async fn stats(&self, session: &Session) -> Result<MaintenanceStats> {
        require_admin(session)?;
        self.maintenance.get_stats().await
    }
}
