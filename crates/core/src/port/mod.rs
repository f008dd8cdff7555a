// Port Layer - Interfaces for external dependencies

pub mod access_code;
pub mod change_publisher;
pub mod credential_hasher;
pub mod entry_repository;
pub mod id_provider; // For deterministic testing
pub mod maintenance;
pub mod queue_repository;
pub mod staff_repository;
pub mod time_provider;
pub mod transaction;
pub mod user_repository;

// Re-exports
pub use access_code::{AccessCodeGenerator, RandomAccessCodeGenerator};
pub use change_publisher::ChangePublisher;
pub use credential_hasher::{Argon2Hasher, CredentialHasher};
pub use entry_repository::{EntryFilter, EntryRepository};
pub use id_provider::IdProvider;
pub use maintenance::{Maintenance, MaintenanceConfig, MaintenanceReport, MaintenanceStats};
pub use queue_repository::QueueRepository;
pub use staff_repository::StaffRepository;
pub use time_provider::TimeProvider;
pub use transaction::{EntryRepositoryTransaction, Transaction, TransactionalEntryRepository};
pub use user_repository::UserRepository;
