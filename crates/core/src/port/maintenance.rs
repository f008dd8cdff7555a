// Store Maintenance port: unresponsive-entry sweep, retention GC, VACUUM
use crate::domain::QueueEntry;
use crate::error::Result;
use async_trait::async_trait;

/// Database maintenance statistics
#[derive(Debug, Clone)]
pub struct MaintenanceStats {
    pub db_size_mb: f64,
    pub db_size_bytes: i64,
    pub entry_count: i64,
    pub finished_entry_count: i64,
}

/// Maintenance configuration
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Retention period for skipped/completed entries (days)
    pub finished_entry_retention_days: i64,

    /// Maximum DB size before forcing VACUUM (MB)
    pub max_db_size_mb: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            finished_entry_retention_days: 7, // Keep finished entries for 7 days
            max_db_size_mb: 500.0,
        }
    }
}

/// Outcome of one housekeeping pass
#[derive(Debug, Clone)]
pub struct MaintenanceReport {
    pub entries_deleted: i64,
    pub vacuum_run: bool,
    pub reclaimed_mb: f64,
    pub before: MaintenanceStats,
    pub after: MaintenanceStats,
}

/// Database maintenance operations
#[async_trait]
pub trait Maintenance: Send + Sync {
    /// Delete called entries whose `called_at` is strictly before `cutoff_millis`.
    ///
    /// # Returns
    /// The deleted entries
    async fn sweep_unresponsive(&self, cutoff_millis: i64) -> Result<Vec<QueueEntry>>;

    /// Delete skipped/completed entries older than the retention period
    ///
    /// # Returns
    /// Number of entries deleted
    async fn gc_finished_entries(&self, retention_days: i64) -> Result<i64>;

    /// Run VACUUM to reclaim space and optimize DB
    ///
    /// # Returns
    /// Space reclaimed in MB
    async fn vacuum(&self) -> Result<f64>;

    /// Get maintenance statistics
    async fn get_stats(&self) -> Result<MaintenanceStats>;

    /// Run full housekeeping (GC, then VACUUM if forced or the DB is large)
    async fn run_full_maintenance(
        &self,
        config: &MaintenanceConfig,
        force_vacuum: bool,
    ) -> Result<MaintenanceReport> {
        let before = self.get_stats().await?;

        let entries_deleted = self
            .gc_finished_entries(config.finished_entry_retention_days)
            .await?;

        let vacuum_run = force_vacuum || before.db_size_mb > config.max_db_size_mb;
        let reclaimed_mb = if vacuum_run { self.vacuum().await? } else { 0.0 };

        let after = self.get_stats().await?;

        tracing::info!(
            entries_deleted = entries_deleted,
            vacuum_run = vacuum_run,
            reclaimed_mb = reclaimed_mb,
            db_size_mb = after.db_size_mb,
            "Maintenance completed"
        );

        Ok(MaintenanceReport {
            entries_deleted,
            vacuum_run,
            reclaimed_mb,
            before,
            after,
        })
    }
}
