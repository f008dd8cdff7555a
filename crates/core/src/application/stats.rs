// Admin statistics

use crate::application::authz::require_admin;
use crate::domain::{EntryStatus, QueueStatus, Session};
use crate::error::Result;
use crate::port::{EntryRepository, Maintenance, QueueRepository, StaffRepository, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Snapshot returned by `admin.stats.v1`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
    pub staff_count: i64,
    pub open_queues: i64,
    pub closed_queues: i64,
    pub waiting_entries: i64,
    pub called_entries: i64,
    pub skipped_entries: i64,
    pub completed_entries: i64,
    pub db_size_mb: f64,
    pub uptime_secs: i64,
}

pub struct StatsService {
    staff_repo: Arc<dyn StaffRepository>,
    queue_repo: Arc<dyn QueueRepository>,
    entry_repo: Arc<dyn EntryRepository>,
    maintenance: Arc<dyn Maintenance>,
    time_provider: Arc<dyn TimeProvider>,
    started_at: i64,
}

impl StatsService {
    pub fn new(
        staff_repo: Arc<dyn StaffRepository>,
        queue_repo: Arc<dyn QueueRepository>,
        entry_repo: Arc<dyn EntryRepository>,
        maintenance: Arc<dyn Maintenance>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let started_at = time_provider.now_millis();
        Self {
            staff_repo,
            queue_repo,
            entry_repo,
            maintenance,
            time_provider,
            started_at,
        }
    }

    pub async fn stats(&self, session: &Session) -> Result<SystemStats> {
        require_admin(session)?;

        let count = |status| self.entry_repo.count_by_status(None, status);
        let store = self.maintenance.get_stats().await?;

        Ok(SystemStats {
            staff_count: self.staff_repo.count().await?,
            open_queues: self.queue_repo.count_by_status(QueueStatus::Open).await?,
            closed_queues: self.queue_repo.count_by_status(QueueStatus::Closed).await?,
            waiting_entries: count(EntryStatus::Waiting).await?,
            called_entries: count(EntryStatus::Called).await?,
            skipped_entries: count(EntryStatus::Skipped).await?,
            completed_entries: count(EntryStatus::Completed).await?,
            db_size_mb: store.db_size_mb,
            uptime_secs: (self.time_provider.now_millis() - self.started_at) / 1000,
        })
    }
}
