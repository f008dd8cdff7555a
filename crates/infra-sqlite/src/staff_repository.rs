// SQLite StaffRepository Implementation

use crate::error::{corrupt_row, map_sqlx_error};
use async_trait::async_trait;
use queuedesk_core::domain::{AccessCode, Queue, StaffId, StaffMember, StaffProfile};
use queuedesk_core::error::{AppError, Result};
use queuedesk_core::port::StaffRepository;
use sqlx::SqlitePool;

pub struct SqliteStaffRepository {
    pool: SqlitePool,
}

impl SqliteStaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffRepository for SqliteStaffRepository {
    async fn insert_with_queue(&self, staff: &StaffMember, queue: &Queue) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO staff (id, name, email, department, unique_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&staff.id)
        .bind(&staff.name)
        .bind(&staff.email)
        .bind(&staff.department)
        .bind(staff.access_code.as_str())
        .bind(staff.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO queues (id, staff_id, status, last_queue_number, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&queue.id)
        .bind(&queue.staff_id)
        .bind(queue.status.to_string())
        .bind(queue.last_queue_number)
        .bind(queue.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &StaffId) -> Result<Option<StaffMember>> {
        let row = sqlx::query_as::<_, StaffRow>("SELECT * FROM staff WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(StaffRow::into_staff).transpose()
    }

    async fn find_by_access_code(&self, code: &AccessCode) -> Result<Option<StaffMember>> {
        let row = sqlx::query_as::<_, StaffRow>("SELECT * FROM staff WHERE unique_id = ?")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(StaffRow::into_staff).transpose()
    }

    async fn list(&self) -> Result<Vec<StaffMember>> {
        let rows = sqlx::query_as::<_, StaffRow>(
            "SELECT * FROM staff ORDER BY department ASC, name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(StaffRow::into_staff).collect()
    }

    async fn update_profile(&self, id: &StaffId, profile: &StaffProfile) -> Result<StaffMember> {
        let row = sqlx::query_as::<_, StaffRow>(
            r#"
            UPDATE staff
            SET name = ?, email = ?, department = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.department)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => row.into_staff(),
            None => Err(AppError::NotFound(format!("Staff {} not found", id))),
        }
    }

    async fn update_access_code(&self, id: &StaffId, code: &AccessCode) -> Result<()> {
        let result = sqlx::query("UPDATE staff SET unique_id = ? WHERE id = ?")
            .bind(code.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Staff {} not found", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: &StaffId) -> Result<bool> {
        // queues and queue_entries follow through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM staff WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn access_code_exists(&self, code: &AccessCode) -> Result<bool> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM staff WHERE unique_id = ?)")
                .bind(code.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(exists != 0)
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM staff")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

// SQLx row mapping
#[derive(sqlx::FromRow)]
struct StaffRow {
    id: String,
    name: String,
    email: String,
    department: String,
    unique_id: String,
    created_at: i64,
}

impl StaffRow {
    fn into_staff(self) -> Result<StaffMember> {
        let access_code =
            AccessCode::parse(&self.unique_id).map_err(|e| corrupt_row("staff", &self.id, e))?;

        Ok(StaffMember {
            id: self.id,
            name: self.name,
            email: self.email,
            department: self.department,
            access_code,
            created_at: self.created_at,
        })
    }
}
