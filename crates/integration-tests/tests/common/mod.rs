//! Shared wiring: real SQLite repositories, manual clock, sequential IDs

#![allow(dead_code)]

use std::sync::Arc;

use queuedesk_core::application::{
    AdminSignup, AuthService, ChangeFeed, MaintenanceScheduler, QueuePolicy, QueueStateService,
    StaffAdminService, StatsService, StudentService,
};
use queuedesk_core::domain::{Queue, Session, StaffMember, StaffProfile};
use queuedesk_core::port::access_code::mocks::ScriptedCodeGenerator;
use queuedesk_core::port::id_provider::mocks::SequentialIdProvider;
use queuedesk_core::port::time_provider::mocks::ManualClock;
use queuedesk_core::port::{
    Argon2Hasher, EntryRepository, Maintenance, MaintenanceConfig, QueueRepository,
    StaffRepository,
};
use queuedesk_infra_sqlite::{
    create_pool, run_migrations, SqliteEntryRepository, SqliteMaintenance, SqliteQueueRepository,
    SqliteStaffRepository, SqliteUserRepository,
};
use sqlx::SqlitePool;
use std::time::Duration;

/// 2024-01-01T09:00:00Z
pub const START_MILLIS: i64 = 1_704_099_600_000;

pub const ADMIN_EMAIL: &str = "registrar@uni.edu";
pub const ADMIN_PASSWORD: &str = "correct-horse";

pub struct Harness {
    pub pool: SqlitePool,
    pub clock: Arc<ManualClock>,
    pub feed: ChangeFeed,
    pub staff_repo: Arc<dyn StaffRepository>,
    pub queue_repo: Arc<dyn QueueRepository>,
    pub entry_repo: Arc<dyn EntryRepository>,
    pub student: Arc<StudentService>,
    pub queue_state: Arc<QueueStateService>,
    pub staff_admin: Arc<StaffAdminService>,
    pub auth: Arc<AuthService>,
    pub stats: Arc<StatsService>,
    pub scheduler: Arc<MaintenanceScheduler>,
}

impl Harness {
    /// Fresh in-memory database
    pub async fn in_memory() -> Self {
        Self::with_url("sqlite::memory:", Vec::<&str>::new()).await
    }

    /// Access codes are handed out in the given order, then randomly
    pub async fn with_codes(codes: &[&str]) -> Self {
        Self::with_url("sqlite::memory:", codes.to_vec()).await
    }

    pub async fn with_url(url: &str, codes: Vec<&str>) -> Self {
        let pool = create_pool(url).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let ids = Arc::new(SequentialIdProvider::new("id"));
        let feed = ChangeFeed::new(256);
        let policy = QueuePolicy::default();

        let staff_repo: Arc<dyn StaffRepository> =
            Arc::new(SqliteStaffRepository::new(pool.clone()));
        let queue_repo: Arc<dyn QueueRepository> =
            Arc::new(SqliteQueueRepository::new(pool.clone()));
        let entries = Arc::new(SqliteEntryRepository::new(pool.clone()));
        let entry_repo: Arc<dyn EntryRepository> = entries.clone();
        let maintenance: Arc<dyn Maintenance> =
            Arc::new(SqliteMaintenance::new(pool.clone(), clock.clone()));

        let student = Arc::new(StudentService::new(
            entries,
            queue_repo.clone(),
            Arc::new(feed.clone()),
            ids.clone(),
            clock.clone(),
            policy,
        ));
        let queue_state = Arc::new(QueueStateService::new(
            queue_repo.clone(),
            entry_repo.clone(),
            maintenance.clone(),
            Arc::new(feed.clone()),
            clock.clone(),
            policy,
        ));
        let staff_admin = Arc::new(StaffAdminService::new(
            staff_repo.clone(),
            queue_repo.clone(),
            Arc::new(ScriptedCodeGenerator::new(codes)),
            Arc::new(feed.clone()),
            ids.clone(),
            clock.clone(),
        ));
        let auth = Arc::new(AuthService::new(
            Arc::new(SqliteUserRepository::new(pool.clone())),
            staff_repo.clone(),
            Arc::new(Argon2Hasher::default()),
            ids,
            clock.clone(),
            true,
        ));
        let stats = Arc::new(StatsService::new(
            staff_repo.clone(),
            queue_repo.clone(),
            entry_repo.clone(),
            maintenance.clone(),
            clock.clone(),
        ));
        let scheduler = Arc::new(MaintenanceScheduler::new(
            queue_state.clone(),
            maintenance,
            MaintenanceConfig::default(),
            Duration::from_millis(50),
            Duration::from_secs(3600),
        ));

        Self {
            pool,
            clock,
            feed,
            staff_repo,
            queue_repo,
            entry_repo,
            student,
            queue_state,
            staff_admin,
            auth,
            stats,
            scheduler,
        }
    }

    /// Sign up and log in the admin
    pub async fn admin(&self) -> Session {
        self.auth
            .admin_signup(AdminSignup {
                email: ADMIN_EMAIL.to_string(),
                name: "Registrar".to_string(),
                password: ADMIN_PASSWORD.to_string(),
            })
            .await
            .unwrap();
        self.auth
            .admin_login(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .unwrap()
    }

    /// Create a staff member and return them with their queue
    pub async fn staff(&self, admin: &Session, name: &str) -> (StaffMember, Queue) {
        let staff = self
            .staff_admin
            .create(
                admin,
                StaffProfile {
                    name: name.to_string(),
                    email: format!("{}@uni.edu", name.to_lowercase()),
                    department: "Computer Science".to_string(),
                },
            )
            .await
            .unwrap();
        let queue = self
            .queue_repo
            .find_by_staff(&staff.id)
            .await
            .unwrap()
            .unwrap();
        (staff, queue)
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.clock.advance_millis(minutes * 60 * 1000);
    }
}

pub fn join_request(queue: &Queue, name: &str) -> queuedesk_core::application::JoinRequest {
    queuedesk_core::application::JoinRequest {
        queue_id: queue.id.clone(),
        student_name: name.to_string(),
        reason: "Course advising".to_string(),
    }
}
