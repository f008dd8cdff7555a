// QueueDesk Infrastructure - SQLite Adapter
// Implements: StaffRepository, QueueRepository, EntryRepository (+ transactional joins),
// UserRepository, Maintenance

mod connection;
mod entry_repository;
mod error;
mod maintenance_impl;
mod migration;
mod queue_repository;
mod staff_repository;
mod transaction;
mod user_repository;

pub use connection::create_pool;
pub use entry_repository::SqliteEntryRepository;
pub use maintenance_impl::SqliteMaintenance;
pub use migration::{current_version, run_migrations};
pub use queue_repository::SqliteQueueRepository;
pub use staff_repository::SqliteStaffRepository;
pub use transaction::SqliteEntryTransaction;
pub use user_repository::SqliteUserRepository;
