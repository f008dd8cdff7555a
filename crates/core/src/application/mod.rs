// Application Layer - Use Cases and Business Logic

pub mod auth;
pub mod authz;
pub mod constants;
pub mod feed;
pub mod maintenance;
pub mod queue_state;
pub mod shutdown;
pub mod staff_admin;
pub mod stats;
pub mod student;

// Re-exports
pub use auth::{AdminSignup, AuthService};
pub use constants::QueuePolicy;
pub use feed::{ChangeFeed, FeedSubscription};
pub use maintenance::MaintenanceScheduler;
pub use queue_state::{DashboardEntry, EntryView, QueueStateService};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use staff_admin::StaffAdminService;
pub use stats::{StatsService, SystemStats};
pub use student::{JoinReceipt, JoinRequest, StudentService};
