// SQLite QueueRepository Implementation

use crate::error::{corrupt_row, map_sqlx_error};
use async_trait::async_trait;
use queuedesk_core::domain::{Queue, QueueId, QueueStatus, QueueSummary, StaffId};
use queuedesk_core::error::{AppError, Result};
use queuedesk_core::port::QueueRepository;
use sqlx::SqlitePool;

pub struct SqliteQueueRepository {
    pool: SqlitePool,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    async fn find_by_id(&self, id: &QueueId) -> Result<Option<Queue>> {
        let row = sqlx::query_as::<_, QueueRow>("SELECT * FROM queues WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(QueueRow::into_queue).transpose()
    }

    async fn find_by_staff(&self, staff_id: &StaffId) -> Result<Option<Queue>> {
        let row = sqlx::query_as::<_, QueueRow>("SELECT * FROM queues WHERE staff_id = ?")
            .bind(staff_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(QueueRow::into_queue).transpose()
    }

    async fn set_status(&self, id: &QueueId, status: QueueStatus) -> Result<Queue> {
        let row = sqlx::query_as::<_, QueueRow>(
            "UPDATE queues SET status = ? WHERE id = ? RETURNING *",
        )
        .bind(status.to_string())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => row.into_queue(),
            None => Err(AppError::NotFound(format!("Queue {} not found", id))),
        }
    }

    async fn summaries(&self) -> Result<Vec<QueueSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                s.id AS staff_id,
                s.name AS staff_name,
                s.department AS department,
                q.id AS queue_id,
                q.status AS status,
                (SELECT COUNT(*) FROM queue_entries e
                  WHERE e.queue_id = q.id AND e.status = 'waiting') AS waiting_count,
                (SELECT COUNT(*) FROM queue_entries e
                  WHERE e.queue_id = q.id AND e.status = 'called') AS called_count
            FROM staff s
            JOIN queues q ON q.staff_id = s.id
            ORDER BY s.department ASC, s.name ASC, s.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(SummaryRow::into_summary).collect()
    }

    async fn count_by_status(&self, status: QueueStatus) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM queues WHERE status = ?")
            .bind(status.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

// SQLx row mapping
#[derive(sqlx::FromRow)]
struct QueueRow {
    id: String,
    staff_id: String,
    status: String,
    last_queue_number: i64,
    created_at: i64,
}

impl QueueRow {
    fn into_queue(self) -> Result<Queue> {
        let status = self
            .status
            .parse::<QueueStatus>()
            .map_err(|e| corrupt_row("queues", &self.id, e))?;

        Ok(Queue {
            id: self.id,
            staff_id: self.staff_id,
            status,
            last_queue_number: self.last_queue_number,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    staff_id: String,
    staff_name: String,
    department: String,
    queue_id: String,
    status: String,
    waiting_count: i64,
    called_count: i64,
}

impl SummaryRow {
    fn into_summary(self) -> Result<QueueSummary> {
        let status = self
            .status
            .parse::<QueueStatus>()
            .map_err(|e| corrupt_row("queues", &self.queue_id, e))?;

        Ok(QueueSummary {
            staff_id: self.staff_id,
            staff_name: self.staff_name,
            department: self.department,
            queue_id: self.queue_id,
            status,
            waiting_count: self.waiting_count,
            called_count: self.called_count,
        })
    }
}
