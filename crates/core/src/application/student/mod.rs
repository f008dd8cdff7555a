// Student Service - anonymous landing page and queue submissions

pub mod join;

pub use join::{JoinReceipt, JoinRequest};

use crate::application::constants::QueuePolicy;
use crate::domain::{ChangeEvent, ChangeKind, QueueSummary};
use crate::error::Result;
use crate::port::{
    ChangePublisher, IdProvider, QueueRepository, TimeProvider, TransactionalEntryRepository,
};
use std::sync::Arc;
use tracing::info;

/// Student Service
pub struct StudentService {
    entry_repo: Arc<dyn TransactionalEntryRepository>,
    queue_repo: Arc<dyn QueueRepository>,
    publisher: Arc<dyn ChangePublisher>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    policy: QueuePolicy,
}

impl StudentService {
    pub fn new(
        entry_repo: Arc<dyn TransactionalEntryRepository>,
        queue_repo: Arc<dyn QueueRepository>,
        publisher: Arc<dyn ChangePublisher>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        policy: QueuePolicy,
    ) -> Self {
        Self {
            entry_repo,
            queue_repo,
            publisher,
            id_provider,
            time_provider,
            policy,
        }
    }

    /// Join a queue. Validation runs before any store access.
    pub async fn join(&self, req: JoinRequest) -> Result<JoinReceipt> {
        let receipt = join::execute(
            self.entry_repo.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            self.policy,
            req,
        )
        .await?;

        info!(
            queue_id = %receipt.entry.queue_id,
            entry_id = %receipt.entry.id,
            queue_number = receipt.entry.queue_number,
            "Student joined queue"
        );
        self.publisher.publish(ChangeEvent::entry(
            ChangeKind::Insert,
            &receipt.entry.id,
            &receipt.entry.queue_id,
            receipt.entry.created_at,
        ));
        Ok(receipt)
    }

    /// Landing page directory: every staff member with queue state
    pub async fn directory(&self) -> Result<Vec<QueueSummary>> {
        self.queue_repo.summaries().await
    }
}
