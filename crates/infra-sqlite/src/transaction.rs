// SQLite Transaction Implementation

use crate::entry_repository::COUNT_ACTIVE_BEFORE;
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use queuedesk_core::domain::{QueueEntry, QueueId, QueueNumber};
use queuedesk_core::error::{AppError, Result};
use queuedesk_core::port::{EntryRepositoryTransaction, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};

pub struct SqliteEntryTransaction<'a> {
    tx: SqlxTransaction<'a, Sqlite>,
}

impl<'a> SqliteEntryTransaction<'a> {
    pub fn new(tx: SqlxTransaction<'a, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Transaction for SqliteEntryTransaction<'_> {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl EntryRepositoryTransaction for SqliteEntryTransaction<'_> {
    async fn reserve_queue_number(&mut self, queue_id: &QueueId) -> Result<QueueNumber> {
        // First statement is a write: the write lock is held until commit
        let reserved: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE queues
            SET last_queue_number = last_queue_number + 1
            WHERE id = ? AND status = 'open'
            RETURNING last_queue_number
            "#,
        )
        .bind(queue_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(number) = reserved {
            return Ok(number);
        }

        let status: Option<String> = sqlx::query_scalar("SELECT status FROM queues WHERE id = ?")
            .bind(queue_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        match status {
            None => Err(AppError::NotFound(format!("Queue {} not found", queue_id))),
            Some(_) => Err(AppError::QueueClosed(format!(
                "Queue {} is not accepting submissions",
                queue_id
            ))),
        }
    }

    async fn insert(&mut self, entry: &QueueEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queue_entries (
                id, queue_id, student_name, reason, queue_number,
                status, called_at, finished_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.queue_id)
        .bind(&entry.student_name)
        .bind(&entry.reason)
        .bind(entry.queue_number)
        .bind(entry.status.as_str())
        .bind(entry.called_at)
        .bind(entry.finished_at)
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn count_active_before(
        &mut self,
        queue_id: &QueueId,
        queue_number: QueueNumber,
    ) -> Result<i64> {
        sqlx::query_scalar(COUNT_ACTIVE_BEFORE)
            .bind(queue_id)
            .bind(queue_number)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)
    }
}
