// Queue Entry Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::QueueId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entry ID (UUID v4)
pub type EntryId = String;

/// Sequential number within one queue, starting at 1
pub type QueueNumber = i64;

/// Maximum student name length (characters)
pub const MAX_STUDENT_NAME_LEN: usize = 100;

/// Maximum reason length (characters)
pub const MAX_REASON_LEN: usize = 500;

/// Entry lifecycle status
///
/// ```text
/// waiting ──call──> called ──complete──> completed
///    │                 │
///    ├──complete───────┼──────────────> completed
///    └──skip───────────┴──skip───────> skipped
/// called ──(timeout)──> deleted by the sweep
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Waiting,
    Called,
    Skipped,
    Completed,
}

impl EntryStatus {
    /// Active entries hold a place in line
    pub fn is_active(self) -> bool {
        matches!(self, EntryStatus::Waiting | EntryStatus::Called)
    }

    pub fn can_transition_to(self, to: EntryStatus) -> bool {
        match (self, to) {
            (EntryStatus::Waiting, EntryStatus::Called) => true,
            (from, EntryStatus::Skipped | EntryStatus::Completed) => from.is_active(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Waiting => "waiting",
            EntryStatus::Called => "called",
            EntryStatus::Skipped => "skipped",
            EntryStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "waiting" => Ok(EntryStatus::Waiting),
            "called" => Ok(EntryStatus::Called),
            "skipped" => Ok(EntryStatus::Skipped),
            "completed" => Ok(EntryStatus::Completed),
            other => Err(DomainError::UnknownVariant {
                kind: "entry status",
                value: other.to_string(),
            }),
        }
    }
}

/// Queue Entry Entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub queue_id: QueueId,
    pub student_name: String,
    pub reason: String,
    pub queue_number: QueueNumber,
    pub status: EntryStatus,
    pub called_at: Option<i64>,   // epoch ms
    pub finished_at: Option<i64>, // epoch ms (skipped/completed)
    pub created_at: i64,          // epoch ms
}

impl QueueEntry {
    /// Create a waiting entry
    ///
    /// # Arguments
    ///
    /// * `id` - Unique entry ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected)
    /// * `queue_id` - Owning queue
    /// * `queue_number` - Number reserved from the queue's sequence
    /// * `submission` - Validated student submission
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        queue_id: impl Into<String>,
        queue_number: QueueNumber,
        submission: Submission,
    ) -> Self {
        Self {
            id: id.into(),
            queue_id: queue_id.into(),
            student_name: submission.student_name,
            reason: submission.reason,
            queue_number,
            status: EntryStatus::Waiting,
            called_at: None,
            finished_at: None,
            created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Check a transition without applying it
    pub fn ensure_transition(&self, to: EntryStatus) -> Result<()> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            })
        }
    }

    /// waiting|called -> skipped
    pub fn skip(&mut self, now_millis: i64) -> Result<()> {
        self.finish(EntryStatus::Skipped, now_millis)
    }

    /// waiting|called -> completed
    pub fn complete(&mut self, now_millis: i64) -> Result<()> {
        self.finish(EntryStatus::Completed, now_millis)
    }

    fn finish(&mut self, to: EntryStatus, now_millis: i64) -> Result<()> {
        self.ensure_transition(to)?;
        self.status = to;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Deadline for a called student to show up (epoch ms)
    pub fn response_deadline(&self, call_timeout_ms: i64) -> Option<i64> {
        match self.status {
            EntryStatus::Called => self.called_at.map(|at| at + call_timeout_ms),
            _ => None,
        }
    }
}

/// Student submission after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub student_name: String,
    pub reason: String,
}

impl Submission {
    /// Validate raw form input. Runs before any store access.
    pub fn parse(student_name: &str, reason: &str) -> Result<Self> {
        let student_name = student_name.trim();
        let reason = reason.trim();

        if student_name.is_empty() {
            return Err(DomainError::ValidationError(
                "student name is required".to_string(),
            ));
        }
        if reason.is_empty() {
            return Err(DomainError::ValidationError("reason is required".to_string()));
        }
        if student_name.chars().count() > MAX_STUDENT_NAME_LEN {
            return Err(DomainError::ValidationError(format!(
                "student name too long (max {} characters)",
                MAX_STUDENT_NAME_LEN
            )));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(DomainError::ValidationError(format!(
                "reason too long (max {} characters)",
                MAX_REASON_LEN
            )));
        }

        Ok(Self {
            student_name: student_name.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// A student's place in line and the wait estimate derived from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePosition {
    /// 1-based: active entries ahead plus one
    pub position: i64,
    pub estimated_wait_minutes: i64,
}

impl QueuePosition {
    pub fn from_ahead(active_ahead: i64, minutes_per_entry: i64) -> Self {
        let position = active_ahead + 1;
        Self {
            position,
            estimated_wait_minutes: position * minutes_per_entry,
        }
    }
}

/// Positions for a queue snapshot, keyed in the order given.
///
/// Only active entries get a position; inactive ones map to `None`.
pub fn positions(entries: &[QueueEntry], minutes_per_entry: i64) -> Vec<Option<QueuePosition>> {
    entries
        .iter()
        .map(|entry| {
            if !entry.is_active() {
                return None;
            }
            let ahead = entries
                .iter()
                .filter(|other| other.is_active() && other.queue_number < entry.queue_number)
                .count() as i64;
            Some(QueuePosition::from_ahead(ahead, minutes_per_entry))
        })
        .collect()
}
