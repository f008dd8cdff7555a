//! Queue State - positions, wait estimates and the entry lifecycle
//!
//! ```text
//! waiting ──call_next──> called ──complete──> completed
//!    └──────skip / complete──────┴──skip────> skipped
//! called ──(call timeout, sweep)──> deleted
//! ```
//!
//! Every mutating operation takes the caller's `Session`; staff may only
//! touch entries in their own queue.

use crate::application::authz::{authorize_queue, require_authenticated};
use crate::application::constants::QueuePolicy;
use crate::domain::error::Result as DomainResult;
use crate::domain::{
    positions, ChangeEvent, ChangeKind, EntryId, Queue, QueueEntry, QueueId,
    QueueNumber, QueuePosition, QueueStatus, Session,
};
use crate::error::{AppError, Result};
use crate::port::{
    ChangePublisher, EntryFilter, EntryRepository, Maintenance, QueueRepository, TimeProvider,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Student status view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryView {
    pub entry: QueueEntry,
    /// Present while the entry is active
    pub position: Option<QueuePosition>,
    /// Present while called: when the sweep may remove the entry (epoch ms)
    pub response_deadline: Option<i64>,
}

/// Staff dashboard row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardEntry {
    pub entry: QueueEntry,
    pub position: Option<QueuePosition>,
    pub response_deadline: Option<i64>,
}

/// Queue State Service
pub struct QueueStateService {
    queue_repo: Arc<dyn QueueRepository>,
    entry_repo: Arc<dyn EntryRepository>,
    maintenance: Arc<dyn Maintenance>,
    publisher: Arc<dyn ChangePublisher>,
    time_provider: Arc<dyn TimeProvider>,
    policy: QueuePolicy,
}

impl QueueStateService {
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        entry_repo: Arc<dyn EntryRepository>,
        maintenance: Arc<dyn Maintenance>,
        publisher: Arc<dyn ChangePublisher>,
        time_provider: Arc<dyn TimeProvider>,
        policy: QueuePolicy,
    ) -> Self {
        Self {
            queue_repo,
            entry_repo,
            maintenance,
            publisher,
            time_provider,
            policy,
        }
    }

    /// Active entries ahead of `queue_number`, plus one; wait = position × minutes per entry
    pub async fn compute_position(
        &self,
        queue_id: &QueueId,
        queue_number: QueueNumber,
    ) -> Result<QueuePosition> {
        let ahead = self
            .entry_repo
            .count_active_before(queue_id, queue_number)
            .await?;
        Ok(QueuePosition::from_ahead(ahead, self.policy.minutes_per_entry))
    }

    /// Student status view for one entry
    pub async fn entry_status(&self, entry_id: &EntryId) -> Result<EntryView> {
        let entry = self.find_entry(entry_id).await?;

        let position = if entry.is_active() {
            Some(
                self.compute_position(&entry.queue_id, entry.queue_number)
                    .await?,
            )
        } else {
            None
        };
        let response_deadline = entry.response_deadline(self.policy.call_timeout_ms);

        Ok(EntryView {
            entry,
            position,
            response_deadline,
        })
    }

    /// Staff dashboard: active entries in number order
    pub async fn list_entries(
        &self,
        session: &Session,
        queue_id: &QueueId,
    ) -> Result<Vec<DashboardEntry>> {
        let queue = self.find_queue(queue_id).await?;
        authorize_queue(session, &queue)?;

        let entries = self
            .entry_repo
            .list_by_queue(queue_id, EntryFilter::Active)
            .await?;
        let positions = positions(&entries, self.policy.minutes_per_entry);

        Ok(entries
            .into_iter()
            .zip(positions)
            .map(|(entry, position)| {
                let response_deadline = entry.response_deadline(self.policy.call_timeout_ms);
                DashboardEntry {
                    entry,
                    position,
                    response_deadline,
                }
            })
            .collect())
    }

    /// Open or close a queue
    pub async fn set_queue_status(
        &self,
        session: &Session,
        queue_id: &QueueId,
        status: QueueStatus,
    ) -> Result<Queue> {
        let queue = self.find_queue(queue_id).await?;
        authorize_queue(session, &queue)?;

        let queue = self.queue_repo.set_status(queue_id, status).await?;

        info!(queue_id = %queue_id, status = %status, by = %session.label(), "Queue status changed");
        self.publisher.publish(ChangeEvent::queue(
            ChangeKind::Update,
            queue_id,
            self.time_provider.now_millis(),
        ));
        Ok(queue)
    }

    /// Call the lowest-numbered waiting entry
    pub async fn call_next(&self, session: &Session, queue_id: &QueueId) -> Result<EntryView> {
        let queue = self.find_queue(queue_id).await?;
        authorize_queue(session, &queue)?;

        let now = self.time_provider.now_millis();
        let entry = self
            .entry_repo
            .call_next(queue_id, now)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No waiting entries in queue {}", queue_id))
            })?;

        info!(
            queue_id = %queue_id,
            entry_id = %entry.id,
            queue_number = entry.queue_number,
            "Entry called"
        );
        self.publisher.publish(ChangeEvent::entry(
            ChangeKind::Update,
            &entry.id,
            queue_id,
            now,
        ));

        let position = self
            .compute_position(queue_id, entry.queue_number)
            .await?;
        let response_deadline = entry.response_deadline(self.policy.call_timeout_ms);
        Ok(EntryView {
            entry,
            position: Some(position),
            response_deadline,
        })
    }

    /// waiting|called -> skipped
    pub async fn skip(&self, session: &Session, entry_id: &EntryId) -> Result<QueueEntry> {
        self.finish(session, entry_id, QueueEntry::skip).await
    }

    /// waiting|called -> completed
    pub async fn complete(&self, session: &Session, entry_id: &EntryId) -> Result<QueueEntry> {
        self.finish(session, entry_id, QueueEntry::complete).await
    }

    async fn finish(
        &self,
        session: &Session,
        entry_id: &EntryId,
        transition: fn(&mut QueueEntry, i64) -> DomainResult<()>,
    ) -> Result<QueueEntry> {
        let mut entry = self.find_entry(entry_id).await?;
        let queue = self.find_queue(&entry.queue_id).await?;
        authorize_queue(session, &queue)?;

        let now = self.time_provider.now_millis();
        transition(&mut entry, now).map_err(|e| AppError::InvalidState(e.to_string()))?;
        let to = entry.status;

        // Conditional update: a concurrent sweep or staff action may have won
        let entry = self.entry_repo.finish(entry_id, to, now).await?;

        info!(entry_id = %entry_id, status = %to, by = %session.label(), "Entry finished");
        self.publisher.publish(ChangeEvent::entry(
            ChangeKind::Update,
            entry_id,
            &entry.queue_id,
            now,
        ));
        Ok(entry)
    }

    /// Delete called entries whose response deadline has passed.
    /// Runs from the maintenance scheduler; no session involved.
    pub async fn sweep_unresponsive(&self) -> Result<Vec<QueueEntry>> {
        let now = self.time_provider.now_millis();
        let cutoff = now - self.policy.call_timeout_ms;

        let removed = self.maintenance.sweep_unresponsive(cutoff).await?;

        for entry in &removed {
            self.publisher.publish(ChangeEvent::entry(
                ChangeKind::Delete,
                &entry.id,
                &entry.queue_id,
                now,
            ));
        }
        if removed.is_empty() {
            debug!("Sweep found no unresponsive entries");
        } else {
            info!(removed = removed.len(), "Unresponsive entries swept");
        }
        Ok(removed)
    }

    /// Manual sweep from a dashboard
    pub async fn sweep_now(&self, session: &Session) -> Result<Vec<QueueEntry>> {
        require_authenticated(session)?;
        self.sweep_unresponsive().await
    }

    async fn find_queue(&self, queue_id: &QueueId) -> Result<Queue> {
        self.queue_repo
            .find_by_id(queue_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Queue {} not found", queue_id)))
    }

    async fn find_entry(&self, entry_id: &EntryId) -> Result<QueueEntry> {
        self.entry_repo
            .find_by_id(entry_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Entry {} not found", entry_id)))
    }
}
