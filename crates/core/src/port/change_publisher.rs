// Change Publisher Port

use crate::domain::ChangeEvent;

/// Sink for row-level change notifications.
/// Publishing never fails and never blocks the caller.
pub trait ChangePublisher: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every published event
    #[derive(Default)]
    pub struct RecordingPublisher {
        events: Mutex<Vec<ChangeEvent>>,
    }

    impl RecordingPublisher {
        pub fn events(&self) -> Vec<ChangeEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ChangePublisher for RecordingPublisher {
        fn publish(&self, event: ChangeEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
