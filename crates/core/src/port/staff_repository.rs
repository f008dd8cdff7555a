// Staff Repository Port (Interface)

use crate::domain::{AccessCode, Queue, StaffId, StaffMember, StaffProfile};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for staff records
#[async_trait]
pub trait StaffRepository: Send + Sync {
    /// Insert a staff member and its queue atomically
    async fn insert_with_queue(&self, staff: &StaffMember, queue: &Queue) -> Result<()>;

    /// Find staff member by ID
    async fn find_by_id(&self, id: &StaffId) -> Result<Option<StaffMember>>;

    /// Find staff member by access code (login lookup)
    async fn find_by_access_code(&self, code: &AccessCode) -> Result<Option<StaffMember>>;

    /// All staff members ordered by name
    async fn list(&self) -> Result<Vec<StaffMember>>;

    /// Overwrite profile fields; NotFound if the row is gone
    async fn update_profile(&self, id: &StaffId, profile: &StaffProfile) -> Result<StaffMember>;

    /// Overwrite the access code; NotFound if the row is gone
    async fn update_access_code(&self, id: &StaffId, code: &AccessCode) -> Result<()>;

    /// Delete staff member (cascades to queue and entries).
    /// Returns false if no row matched.
    async fn delete(&self, id: &StaffId) -> Result<bool>;

    /// Whether any staff member currently holds this code
    async fn access_code_exists(&self, code: &AccessCode) -> Result<bool>;

    /// Total number of staff members
    async fn count(&self) -> Result<i64>;
}
