// Change Feed Events

use serde::{Deserialize, Serialize};

/// Table a change happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Staff,
    Queues,
    QueueEntries,
}

/// Row-level change kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row-level change notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub row_id: String,
    /// Queue the row belongs to (queues and entries only)
    pub queue_id: Option<String>,
    pub at: i64, // epoch ms
}

impl ChangeEvent {
    pub fn staff(kind: ChangeKind, staff_id: impl Into<String>, at: i64) -> Self {
        Self {
            table: Table::Staff,
            kind,
            row_id: staff_id.into(),
            queue_id: None,
            at,
        }
    }

    pub fn queue(kind: ChangeKind, queue_id: impl Into<String>, at: i64) -> Self {
        let queue_id = queue_id.into();
        Self {
            table: Table::Queues,
            kind,
            row_id: queue_id.clone(),
            queue_id: Some(queue_id),
            at,
        }
    }

    pub fn entry(
        kind: ChangeKind,
        entry_id: impl Into<String>,
        queue_id: impl Into<String>,
        at: i64,
    ) -> Self {
        Self {
            table: Table::QueueEntries,
            kind,
            row_id: entry_id.into(),
            queue_id: Some(queue_id.into()),
            at,
        }
    }
}

/// Subscriber-side filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilter {
    #[serde(default)]
    pub table: Option<Table>,
    #[serde(default)]
    pub row_id: Option<String>,
    #[serde(default)]
    pub queue_id: Option<String>,
}

impl FeedFilter {
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if self.table.is_some_and(|t| t != event.table) {
            return false;
        }
        if let Some(row_id) = &self.row_id {
            if row_id != &event.row_id {
                return false;
            }
        }
        if let Some(queue_id) = &self.queue_id {
            if event.queue_id.as_ref() != Some(queue_id) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = FeedFilter::default();
        assert!(filter.matches(&ChangeEvent::staff(ChangeKind::Insert, "s-1", 1)));
        assert!(filter.matches(&ChangeEvent::entry(ChangeKind::Delete, "e-1", "q-1", 1)));
    }

    #[test]
    fn test_filter_by_table_and_queue() {
        let filter = FeedFilter {
            table: Some(Table::QueueEntries),
            queue_id: Some("q-1".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&ChangeEvent::entry(ChangeKind::Update, "e-1", "q-1", 1)));
        assert!(!filter.matches(&ChangeEvent::entry(ChangeKind::Update, "e-2", "q-2", 1)));
        assert!(!filter.matches(&ChangeEvent::queue(ChangeKind::Update, "q-1", 1)));
    }

    #[test]
    fn test_filter_by_row_id() {
        let filter = FeedFilter {
            row_id: Some("e-9".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&ChangeEvent::entry(ChangeKind::Update, "e-9", "q-1", 1)));
        assert!(!filter.matches(&ChangeEvent::entry(ChangeKind::Update, "e-8", "q-1", 1)));
    }
}
