// SQLite Maintenance Implementation
use crate::entry_repository::EntryRow;
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use queuedesk_core::domain::QueueEntry;
use queuedesk_core::error::{AppError, Result};
use queuedesk_core::port::{Maintenance, MaintenanceStats, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

/// SQLite maintenance implementation
pub struct SqliteMaintenance {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteMaintenance {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    /// Get DB file size in MB
    async fn get_db_size(&self) -> Result<f64> {
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get page count: {}", e)))?;

        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get page size: {}", e)))?;

        let size_bytes = page_count * page_size;
        Ok(size_bytes as f64 / (1024.0 * 1024.0))
    }
}

#[async_trait]
impl Maintenance for SqliteMaintenance {
    async fn sweep_unresponsive(&self, cutoff_millis: i64) -> Result<Vec<QueueEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            DELETE FROM queue_entries
            WHERE status = 'called'
              AND called_at IS NOT NULL
              AND called_at < ?
            RETURNING *
            "#,
        )
        .bind(cutoff_millis)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(EntryRow::into_entry).collect()
    }

    async fn gc_finished_entries(&self, retention_days: i64) -> Result<i64> {
        let now = self.time_provider.now_millis();
        let retention_ms = retention_days * 24 * 60 * 60 * 1000;
        let cutoff_time = now - retention_ms;

        info!(
            retention_days = retention_days,
            cutoff_time = cutoff_time,
            "Running finished entry GC"
        );

        let result = sqlx::query(
            r#"
            DELETE FROM queue_entries
            WHERE status IN ('skipped', 'completed')
            AND finished_at IS NOT NULL
            AND finished_at < ?
            "#,
        )
        .bind(cutoff_time)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Entry GC failed: {}", e)))?;

        let deleted = result.rows_affected() as i64;
        info!(deleted_entries = deleted, "Finished entry GC completed");

        Ok(deleted)
    }

    async fn vacuum(&self) -> Result<f64> {
        info!("Running VACUUM to optimize database...");

        let size_before = self.get_db_size().await?;

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("VACUUM failed: {}", e)))?;

        let size_after = self.get_db_size().await?;
        let reclaimed = (size_before - size_after).max(0.0);

        info!(
            size_before_mb = size_before,
            size_after_mb = size_after,
            reclaimed_mb = reclaimed,
            "VACUUM completed"
        );

        Ok(reclaimed)
    }

    async fn get_stats(&self) -> Result<MaintenanceStats> {
        let db_size_mb = self.get_db_size().await?;

        let entry_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queue_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to count entries: {}", e)))?;

        let finished_entry_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM queue_entries WHERE status IN ('skipped', 'completed')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to count finished entries: {}", e)))?;

        let db_size_bytes = (db_size_mb * 1024.0 * 1024.0) as i64;

        Ok(MaintenanceStats {
            db_size_mb,
            db_size_bytes,
            entry_count,
            finished_entry_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, SqliteEntryRepository, SqliteStaffRepository};
    use queuedesk_core::domain::{
        AccessCode, EntryStatus, Queue, StaffMember, StaffProfile, Submission,
    };
    use queuedesk_core::port::time_provider::mocks::ManualClock;
    use queuedesk_core::port::{EntryRepository, StaffRepository, TransactionalEntryRepository};

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    async fn setup(clock: Arc<ManualClock>) -> (SqliteEntryRepository, SqliteMaintenance) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let profile = StaffProfile {
            name: "Lovelace".to_string(),
            email: "ada@uni.edu".to_string(),
            department: "Math".to_string(),
        };
        let staff = StaffMember::new("s1", 0, profile, AccessCode::parse("LOVE0001").unwrap());
        SqliteStaffRepository::new(pool.clone())
            .insert_with_queue(&staff, &Queue::new("q1", "s1", 0))
            .await
            .unwrap();

        (
            SqliteEntryRepository::new(pool.clone()),
            SqliteMaintenance::new(pool, clock),
        )
    }

    async fn add_entry(repo: &SqliteEntryRepository, id: &str, at: i64) {
        let mut tx = repo.begin_transaction().await.unwrap();
        let number = tx.reserve_queue_number(&"q1".to_string()).await.unwrap();
        let entry = QueueEntry::new(
            id,
            at,
            "q1",
            number,
            Submission::parse("Student", "question").unwrap(),
        );
        tx.insert(&entry).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_maintenance_stats() {
        let clock = Arc::new(ManualClock::new(0));
        let (_, maintenance) = setup(clock).await;

        let stats = maintenance.get_stats().await.unwrap();
        assert!(stats.db_size_mb > 0.0);
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.finished_entry_count, 0);
    }

    #[tokio::test]
    async fn test_vacuum() {
        let clock = Arc::new(ManualClock::new(0));
        let (_, maintenance) = setup(clock).await;

        // VACUUM should not error (even if no space is reclaimed in memory DB)
        let reclaimed = maintenance.vacuum().await.unwrap();
        assert!(reclaimed >= 0.0);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_calls() {
        let clock = Arc::new(ManualClock::new(0));
        let (repo, maintenance) = setup(clock).await;
        let now = 60 * 60 * 1000;

        add_entry(&repo, "old", 0).await;
        add_entry(&repo, "fresh", 0).await;
        add_entry(&repo, "waiting", 0).await;
        // called 6 minutes ago and 2 minutes ago
        repo.call_next(&"q1".to_string(), now - 6 * 60 * 1000)
            .await
            .unwrap();
        repo.call_next(&"q1".to_string(), now - 2 * 60 * 1000)
            .await
            .unwrap();

        let removed = maintenance
            .sweep_unresponsive(now - 5 * 60 * 1000)
            .await
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "old");

        assert!(repo.find_by_id(&"old".to_string()).await.unwrap().is_none());
        assert!(repo.find_by_id(&"fresh".to_string()).await.unwrap().is_some());
        assert!(repo.find_by_id(&"waiting".to_string()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_gc_finished_entries() {
        let clock = Arc::new(ManualClock::new(20 * DAY_MS));
        let (repo, maintenance) = setup(clock).await;

        add_entry(&repo, "ancient", 0).await;
        add_entry(&repo, "recent", 0).await;
        add_entry(&repo, "active", 0).await;
        repo.finish(&"ancient".to_string(), EntryStatus::Completed, 10 * DAY_MS)
            .await
            .unwrap();
        repo.finish(&"recent".to_string(), EntryStatus::Skipped, 19 * DAY_MS)
            .await
            .unwrap();

        // GC with 7 day retention deletes only the 10-day-old entry
        let deleted = maintenance.gc_finished_entries(7).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(repo.find_by_id(&"ancient".to_string()).await.unwrap().is_none());
        assert!(repo.find_by_id(&"recent".to_string()).await.unwrap().is_some());
        assert!(repo.find_by_id(&"active".to_string()).await.unwrap().is_some());
    }
}
