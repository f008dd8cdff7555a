// Transaction port for atomic submissions

use crate::domain::{QueueEntry, QueueId, QueueNumber};
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Transactional entry operations
#[async_trait]
pub trait TransactionalEntryRepository: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<Box<dyn EntryRepositoryTransaction>>;
}

/// Entry operations within a transaction
#[async_trait]
pub trait EntryRepositoryTransaction: Transaction {
    /// Increment-and-return the queue's number sequence.
    /// NotFound if the queue is gone, QueueClosed if it is not open.
    async fn reserve_queue_number(&mut self, queue_id: &QueueId) -> Result<QueueNumber>;

    /// Insert entry (within transaction)
    async fn insert(&mut self, entry: &QueueEntry) -> Result<()>;

    /// Active entries ahead of `queue_number` (within transaction)
    async fn count_active_before(
        &mut self,
        queue_id: &QueueId,
        queue_number: QueueNumber,
    ) -> Result<i64>;
}
