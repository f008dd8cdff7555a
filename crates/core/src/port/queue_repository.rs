// Queue Repository Port (Interface)

use crate::domain::{Queue, QueueId, QueueStatus, QueueSummary, StaffId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for queues
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Find queue by ID
    async fn find_by_id(&self, id: &QueueId) -> Result<Option<Queue>>;

    /// Find the queue owned by a staff member
    async fn find_by_staff(&self, staff_id: &StaffId) -> Result<Option<Queue>>;

    /// Open or close a queue; NotFound if the row is gone
    async fn set_status(&self, id: &QueueId, status: QueueStatus) -> Result<Queue>;

    /// Public directory: every staff member with queue state and counts
    async fn summaries(&self) -> Result<Vec<QueueSummary>>;

    /// Count queues by status
    async fn count_by_status(&self, status: QueueStatus) -> Result<i64>;
}
