// Domain Layer - Pure business logic and entities

pub mod change;
pub mod entry;
pub mod error;
pub mod queue;
pub mod staff;
pub mod user;

// Re-exports
pub use change::{ChangeEvent, ChangeKind, FeedFilter, Table};
pub use entry::{
    positions, EntryId, EntryStatus, QueueEntry, QueueNumber, QueuePosition, Submission,
};
pub use error::DomainError;
pub use queue::{Queue, QueueId, QueueStatus, QueueSummary};
pub use staff::{AccessCode, StaffId, StaffMember, StaffProfile};
pub use user::{AdminIdentity, Role, Session, StaffIdentity, UserId, UserProfile};
