// Entry Repository Port (Interface)

use crate::domain::{EntryId, EntryStatus, QueueEntry, QueueId, QueueNumber};
use crate::error::Result;
use async_trait::async_trait;

/// Which entries of a queue to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFilter {
    /// waiting and called only
    Active,
    All,
}

/// Repository interface for queue entries
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Find entry by ID
    async fn find_by_id(&self, id: &EntryId) -> Result<Option<QueueEntry>>;

    /// Entries of a queue ordered by queue number
    async fn list_by_queue(&self, queue_id: &QueueId, filter: EntryFilter)
        -> Result<Vec<QueueEntry>>;

    /// Active entries in the queue with a number strictly below `queue_number`
    async fn count_active_before(&self, queue_id: &QueueId, queue_number: QueueNumber)
        -> Result<i64>;

    /// Atomically mark the lowest-numbered waiting entry as called
    async fn call_next(&self, queue_id: &QueueId, now_millis: i64) -> Result<Option<QueueEntry>>;

    /// Move an active entry to skipped/completed.
    /// NotFound for unknown IDs, InvalidState if the entry is no longer active.
    async fn finish(&self, id: &EntryId, to: EntryStatus, now_millis: i64) -> Result<QueueEntry>;

    /// Count entries by status, optionally within one queue
    async fn count_by_status(&self, queue_id: Option<&QueueId>, status: EntryStatus)
        -> Result<i64>;
}
