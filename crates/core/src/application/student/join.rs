// Join Queue Use Case

use crate::application::constants::QueuePolicy;
use crate::domain::{QueueEntry, QueueId, QueuePosition, Submission};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TimeProvider, TransactionalEntryRepository};
use serde::{Deserialize, Serialize};

/// Raw join form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub queue_id: QueueId,
    pub student_name: String,
    pub reason: String,
}

/// What the student gets back after joining
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinReceipt {
    pub entry: QueueEntry,
    pub position: QueuePosition,
}

/// Validate the form without touching the store
pub fn validate_request(req: &JoinRequest) -> Result<Submission> {
    if req.queue_id.trim().is_empty() {
        return Err(AppError::Validation("queue_id is required".to_string()));
    }
    Submission::parse(&req.student_name, &req.reason)
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Execute join use case (number reservation and insert share one transaction)
///
/// # Arguments
///
/// * `entry_repo` - Transactional entry repository
/// * `id_provider` - ID generator (injected for determinism)
/// * `time_provider` - Time provider (injected for determinism)
/// * `policy` - Wait estimate settings
/// * `req` - Join request
pub async fn execute(
    entry_repo: &dyn TransactionalEntryRepository,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    policy: QueuePolicy,
    req: JoinRequest,
) -> Result<JoinReceipt> {
    let submission = validate_request(&req)?;

    let mut tx = entry_repo.begin_transaction().await?;

    // Closed or missing queue: nothing was written, roll back and report
    let queue_number = match tx.reserve_queue_number(&req.queue_id).await {
        Ok(number) => number,
        Err(e) => {
            tx.rollback().await?;
            return Err(e);
        }
    };

    let entry = QueueEntry::new(
        id_provider.generate_id(),
        time_provider.now_millis(),
        req.queue_id,
        queue_number,
        submission,
    );
    tx.insert(&entry).await?;
    let active_ahead = tx.count_active_before(&entry.queue_id, queue_number).await?;

    tx.commit().await?;

    Ok(JoinReceipt {
        position: QueuePosition::from_ahead(active_ahead, policy.minutes_per_entry),
        entry,
    })
}
