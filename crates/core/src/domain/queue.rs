// Queue Domain Model

use crate::domain::error::DomainError;
use crate::domain::StaffId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Queue identifier (UUID v4)
pub type QueueId = String;

/// Whether a queue accepts new submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Open,
    Closed,
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueStatus::Open => write!(f, "open"),
            QueueStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for QueueStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(QueueStatus::Open),
            "closed" => Ok(QueueStatus::Closed),
            other => Err(DomainError::UnknownVariant {
                kind: "queue status",
                value: other.to_string(),
            }),
        }
    }
}

/// Queue Entity: one per staff member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub staff_id: StaffId,
    pub status: QueueStatus,
    /// Highest queue number handed out so far (0 = none)
    pub last_queue_number: i64,
    pub created_at: i64, // epoch ms
}

impl Queue {
    /// New queues start open with no numbers issued
    pub fn new(id: impl Into<String>, staff_id: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            staff_id: staff_id.into(),
            status: QueueStatus::Open,
            last_queue_number: 0,
            created_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == QueueStatus::Open
    }
}

/// Public directory row (landing page): staff member plus queue state.
/// Never carries the access code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSummary {
    pub staff_id: StaffId,
    pub staff_name: String,
    pub department: String,
    pub queue_id: QueueId,
    pub status: QueueStatus,
    pub waiting_count: i64,
    pub called_count: i64,
}
