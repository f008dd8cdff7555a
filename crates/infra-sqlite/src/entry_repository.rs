// SQLite EntryRepository Implementation

use crate::error::{corrupt_row, map_sqlx_error};
use crate::SqliteEntryTransaction;
use async_trait::async_trait;
use queuedesk_core::domain::{EntryId, EntryStatus, QueueEntry, QueueId, QueueNumber};
use queuedesk_core::error::{AppError, Result};
use queuedesk_core::port::{
    EntryFilter, EntryRepository, EntryRepositoryTransaction, TransactionalEntryRepository,
};
use sqlx::SqlitePool;

pub struct SqliteEntryRepository {
    pool: SqlitePool,
}

impl SqliteEntryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryRepository for SqliteEntryRepository {
    async fn find_by_id(&self, id: &EntryId) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>("SELECT * FROM queue_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn list_by_queue(
        &self,
        queue_id: &QueueId,
        filter: EntryFilter,
    ) -> Result<Vec<QueueEntry>> {
        let sql = match filter {
            EntryFilter::Active => {
                r#"
                SELECT * FROM queue_entries
                WHERE queue_id = ? AND status IN ('waiting', 'called')
                ORDER BY queue_number ASC
                "#
            }
            EntryFilter::All => {
                "SELECT * FROM queue_entries WHERE queue_id = ? ORDER BY queue_number ASC"
            }
        };

        let rows = sqlx::query_as::<_, EntryRow>(sql)
            .bind(queue_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(EntryRow::into_entry).collect()
    }

    async fn count_active_before(
        &self,
        queue_id: &QueueId,
        queue_number: QueueNumber,
    ) -> Result<i64> {
        sqlx::query_scalar(COUNT_ACTIVE_BEFORE)
            .bind(queue_id)
            .bind(queue_number)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn call_next(&self, queue_id: &QueueId, now_millis: i64) -> Result<Option<QueueEntry>> {
        // Select and mark in one statement so two staff clicks never call the same entry
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            UPDATE queue_entries
            SET status = 'called', called_at = ?
            WHERE id = (
                SELECT id FROM queue_entries
                WHERE queue_id = ? AND status = 'waiting'
                ORDER BY queue_number ASC
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(now_millis)
        .bind(queue_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn finish(&self, id: &EntryId, to: EntryStatus, now_millis: i64) -> Result<QueueEntry> {
        if !matches!(to, EntryStatus::Skipped | EntryStatus::Completed) {
            return Err(AppError::InvalidState(format!(
                "{} is not a finishing status",
                to
            )));
        }

        // Conditional update: only active entries can finish
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            UPDATE queue_entries
            SET status = ?, finished_at = ?
            WHERE id = ? AND status IN ('waiting', 'called')
            RETURNING *
            "#,
        )
        .bind(to.as_str())
        .bind(now_millis)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(row) = row {
            return row.into_entry();
        }

        // Nothing updated: either gone (swept) or already finished
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM queue_entries WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        match current {
            None => Err(AppError::NotFound(format!("Entry {} not found", id))),
            Some(current) => Err(AppError::InvalidState(format!(
                "Cannot move entry {} from {} to {}",
                id, current, to
            ))),
        }
    }

    async fn count_by_status(
        &self,
        queue_id: Option<&QueueId>,
        status: EntryStatus,
    ) -> Result<i64> {
        let count: std::result::Result<i64, sqlx::Error> = match queue_id {
            Some(queue_id) => sqlx::query_scalar(
                "SELECT COUNT(*) FROM queue_entries WHERE queue_id = ? AND status = ?",
            )
            .bind(queue_id)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await,
            None => sqlx::query_scalar("SELECT COUNT(*) FROM queue_entries WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await,
        };

        count.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl TransactionalEntryRepository for SqliteEntryRepository {
    async fn begin_transaction(&self) -> Result<Box<dyn EntryRepositoryTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteEntryTransaction::new(tx)))
    }
}

pub(crate) const COUNT_ACTIVE_BEFORE: &str = r#"
    SELECT COUNT(*) FROM queue_entries
    WHERE queue_id = ? AND queue_number < ? AND status IN ('waiting', 'called')
"#;

// SQLx row mapping
#[derive(sqlx::FromRow)]
pub(crate) struct EntryRow {
    id: String,
    queue_id: String,
    student_name: String,
    reason: String,
    queue_number: i64,
    status: String,
    called_at: Option<i64>,
    finished_at: Option<i64>,
    created_at: i64,
}

impl EntryRow {
    pub(crate) fn into_entry(self) -> Result<QueueEntry> {
        let status = self
            .status
            .parse::<EntryStatus>()
            .map_err(|e| corrupt_row("queue_entries", &self.id, e))?;

        Ok(QueueEntry {
            id: self.id,
            queue_id: self.queue_id,
            student_name: self.student_name,
            reason: self.reason,
            queue_number: self.queue_number,
            status,
            called_at: self.called_at,
            finished_at: self.finished_at,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, SqliteStaffRepository};
    use queuedesk_core::domain::{
        AccessCode, Queue, QueueStatus, StaffMember, StaffProfile, Submission,
    };
    use queuedesk_core::port::StaffRepository;

    async fn setup() -> (SqlitePool, SqliteEntryRepository, Queue) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let profile = StaffProfile {
            name: "Hopper".to_string(),
            email: "hopper@uni.edu".to_string(),
            department: "CS".to_string(),
        };
        let staff = StaffMember::new("s1", 1, profile, AccessCode::parse("HOPP0001").unwrap());
        let queue = Queue::new("q1", "s1", 1);
        SqliteStaffRepository::new(pool.clone())
            .insert_with_queue(&staff, &queue)
            .await
            .unwrap();

        (pool.clone(), SqliteEntryRepository::new(pool), queue)
    }

    async fn join(repo: &SqliteEntryRepository, queue_id: &str, id: &str) -> QueueEntry {
        let mut tx = repo.begin_transaction().await.unwrap();
        let number = tx.reserve_queue_number(&queue_id.to_string()).await.unwrap();
        let entry = QueueEntry::new(
            id,
            number * 10,
            queue_id,
            number,
            Submission::parse("Ada", "advising").unwrap(),
        );
        tx.insert(&entry).await.unwrap();
        tx.commit().await.unwrap();
        entry
    }

    #[tokio::test]
    async fn test_numbers_are_sequential() {
        let (_, repo, queue) = setup().await;
        let first = join(&repo, &queue.id, "e1").await;
        let second = join(&repo, &queue.id, "e2").await;
        assert_eq!(first.queue_number, 1);
        assert_eq!(second.queue_number, 2);
    }

    #[tokio::test]
    async fn test_call_next_picks_lowest_waiting() {
        let (_, repo, queue) = setup().await;
        join(&repo, &queue.id, "e1").await;
        join(&repo, &queue.id, "e2").await;

        let called = repo.call_next(&queue.id, 500).await.unwrap().unwrap();
        assert_eq!(called.id, "e1");
        assert_eq!(called.status, EntryStatus::Called);
        assert_eq!(called.called_at, Some(500));

        let next = repo.call_next(&queue.id, 600).await.unwrap().unwrap();
        assert_eq!(next.id, "e2");

        assert!(repo.call_next(&queue.id, 700).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_active_before_counts_called() {
        let (_, repo, queue) = setup().await;
        join(&repo, &queue.id, "e1").await;
        join(&repo, &queue.id, "e2").await;
        join(&repo, &queue.id, "e3").await;
        repo.call_next(&queue.id, 100).await.unwrap();
        repo.finish(&"e2".to_string(), EntryStatus::Skipped, 200)
            .await
            .unwrap();

        // e1 called (active), e2 skipped (not)
        assert_eq!(repo.count_active_before(&queue.id, 3).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_finish_twice_is_invalid_state() {
        let (_, repo, queue) = setup().await;
        join(&repo, &queue.id, "e1").await;

        let done = repo
            .finish(&"e1".to_string(), EntryStatus::Completed, 100)
            .await
            .unwrap();
        assert_eq!(done.finished_at, Some(100));

        let err = repo
            .finish(&"e1".to_string(), EntryStatus::Skipped, 200)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let err = repo
            .finish(&"nope".to_string(), EntryStatus::Skipped, 200)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reserve_on_closed_queue_fails() {
        let (pool, repo, queue) = setup().await;
        sqlx::query("UPDATE queues SET status = ? WHERE id = ?")
            .bind(QueueStatus::Closed.to_string())
            .bind(&queue.id)
            .execute(&pool)
            .await
            .unwrap();

        let mut tx = repo.begin_transaction().await.unwrap();
        let err = tx.reserve_queue_number(&queue.id).await.unwrap_err();
        assert!(matches!(err, AppError::QueueClosed(_)));
        tx.rollback().await.unwrap();

        let mut tx = repo.begin_transaction().await.unwrap();
        let err = tx
            .reserve_queue_number(&"missing".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_active_excludes_finished() {
        let (_, repo, queue) = setup().await;
        join(&repo, &queue.id, "e1").await;
        join(&repo, &queue.id, "e2").await;
        repo.finish(&"e1".to_string(), EntryStatus::Completed, 1)
            .await
            .unwrap();

        let active = repo
            .list_by_queue(&queue.id, EntryFilter::Active)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "e2");

        let all = repo.list_by_queue(&queue.id, EntryFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(
            repo.count_by_status(Some(&queue.id), EntryStatus::Completed)
                .await
                .unwrap(),
            1
        );
    }
}
