// In-process change feed (publish/subscribe over tokio broadcast)

use crate::domain::{ChangeEvent, FeedFilter};
use crate::port::ChangePublisher;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Fan-out of row-level change events to any number of subscribers
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe from now on; earlier events are not replayed
    pub fn subscribe(&self, filter: FeedFilter) -> FeedSubscription {
        FeedSubscription {
            rx: self.tx.subscribe(),
            filter,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl ChangePublisher for ChangeFeed {
    fn publish(&self, event: ChangeEvent) {
        // No subscribers is not an error
        if let Err(broadcast::error::SendError(event)) = self.tx.send(event) {
            debug!(table = ?event.table, row_id = %event.row_id, "Change dropped: no subscribers");
        }
    }
}

/// One subscriber's filtered view of the feed
pub struct FeedSubscription {
    rx: broadcast::Receiver<ChangeEvent>,
    filter: FeedFilter,
}

impl FeedSubscription {
    /// Next matching event, or `None` once the feed is gone.
    /// Events lost to lag are skipped.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Feed subscriber lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
