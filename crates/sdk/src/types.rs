//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from the api-rpc crate. Entities reuse the
//! core domain types.

use queuedesk_core::domain::{QueueEntry, QueueId, Session, StaffId, StaffMember};
use serde::{Deserialize, Serialize};

/// Student form for `queue.join.v1`
#[derive(Debug, Clone, Serialize)]
pub struct JoinRequest {
    pub queue_id: QueueId,
    pub student_name: String,
    pub reason: String,
}

/// Fields for creating or editing a staff member
#[derive(Debug, Clone, Serialize)]
pub struct StaffForm {
    pub name: String,
    pub email: String,
    pub department: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSignupResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub session: Session,
    pub expires_at: i64,
    pub queue_id: Option<QueueId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhoamiResponse {
    pub session: Session,
    pub queue_id: Option<QueueId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepResponse {
    pub removed: Vec<QueueEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffListResponse {
    pub staff: Vec<StaffMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResponse {
    pub staff_id: StaffId,
    pub deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceResponse {
    pub vacuum_run: bool,
    pub entries_deleted: i64,
    pub reclaimed_mb: f64,
    pub db_size_before: i64,
    pub db_size_after: i64,
}
