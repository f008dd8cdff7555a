//! RPC Request/Response Types
//!
//! Every method takes a single JSON object. Methods that need a caller
//! identity read the bearer token from its `token` field; no token means an
//! anonymous caller.

use queuedesk_core::domain::{
    QueueEntry, QueueId, QueueStatus, Session, StaffId, StaffMember, StaffProfile,
};
use queuedesk_core::port::MaintenanceReport;
use serde::{Deserialize, Serialize};

/// directory.list.v1
#[derive(Debug, Default, Deserialize)]
pub struct DirectoryRequest {}

/// queue.join.v1
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub queue_id: QueueId,
    pub student_name: String,
    pub reason: String,
}

/// entry.status.v1
#[derive(Debug, Deserialize)]
pub struct EntryStatusRequest {
    pub entry_id: String,
}

/// auth.admin_signup.v1
#[derive(Debug, Deserialize)]
pub struct AdminSignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSignupResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

/// auth.admin_login.v1
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

/// auth.staff_login.v1
#[derive(Debug, Deserialize)]
pub struct StaffLoginRequest {
    pub access_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub session: Session,
    pub expires_at: i64,
    /// The staff member's own queue (staff sessions only)
    pub queue_id: Option<QueueId>,
}

/// auth.logout.v1, auth.whoami.v1, admin.staff.list.v1, admin.stats.v1, queue.sweep.v1
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoamiResponse {
    pub session: Session,
    pub queue_id: Option<QueueId>,
}

/// queue.entries.v1, queue.call_next.v1
///
/// Staff may omit `queue_id` to mean their own queue.
#[derive(Debug, Deserialize)]
pub struct QueueRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub queue_id: Option<QueueId>,
}

/// queue.set_status.v1
#[derive(Debug, Deserialize)]
pub struct SetQueueStatusRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub queue_id: Option<QueueId>,
    pub status: QueueStatus,
}

/// entry.skip.v1, entry.complete.v1
#[derive(Debug, Deserialize)]
pub struct EntryActionRequest {
    #[serde(default)]
    pub token: Option<String>,
    pub entry_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResponse {
    pub removed: Vec<QueueEntry>,
}

/// admin.staff.create.v1
#[derive(Debug, Deserialize)]
pub struct StaffCreateRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub profile: StaffProfile,
}

/// admin.staff.update.v1
#[derive(Debug, Deserialize)]
pub struct StaffUpdateRequest {
    #[serde(default)]
    pub token: Option<String>,
    pub staff_id: StaffId,
    #[serde(flatten)]
    pub profile: StaffProfile,
}

/// admin.staff.delete.v1, admin.staff.regenerate_code.v1
#[derive(Debug, Deserialize)]
pub struct StaffIdRequest {
    #[serde(default)]
    pub token: Option<String>,
    pub staff_id: StaffId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffListResponse {
    pub staff: Vec<StaffMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub staff_id: StaffId,
    pub deleted: bool,
}

/// admin.maintenance.v1 - Run manual housekeeping
#[derive(Debug, Deserialize)]
pub struct MaintenanceRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub force_vacuum: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceResponse {
    pub vacuum_run: bool,
    pub entries_deleted: i64,
    pub reclaimed_mb: f64,
    pub db_size_before: i64,
    pub db_size_after: i64,
}

impl From<MaintenanceReport> for MaintenanceResponse {
    fn from(report: MaintenanceReport) -> Self {
        Self {
            vacuum_run: report.vacuum_run,
            entries_deleted: report.entries_deleted,
            reclaimed_mb: report.reclaimed_mb,
            db_size_before: report.before.db_size_bytes,
            db_size_after: report.after.db_size_bytes,
        }
    }
}
