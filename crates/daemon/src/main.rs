//! QueueDesk - Server Entry Point
//! Composition root: settings, logging, database, services, RPC server, background sweep

mod logging;
mod settings;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use queuedesk_api_rpc::{RpcContext, RpcServer, RpcServerConfig, SessionRegistry};
use queuedesk_core::application::constants::DEFAULT_FEED_CAPACITY;
use queuedesk_core::application::{
    shutdown_channel, AuthService, ChangeFeed, MaintenanceScheduler, QueuePolicy,
    QueueStateService, StaffAdminService, StatsService, StudentService,
};
use queuedesk_core::port::id_provider::UuidProvider;
use queuedesk_core::port::time_provider::SystemTimeProvider;
use queuedesk_core::port::{
    AccessCodeGenerator, Argon2Hasher, ChangePublisher, CredentialHasher, EntryRepository,
    IdProvider, Maintenance, MaintenanceConfig, QueueRepository, RandomAccessCodeGenerator,
    StaffRepository, TimeProvider, TransactionalEntryRepository, UserRepository,
};
use queuedesk_infra_sqlite::{
    create_pool, run_migrations, SqliteEntryRepository, SqliteMaintenance, SqliteQueueRepository,
    SqliteStaffRepository, SqliteUserRepository,
};
use settings::Settings;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let settings = Settings::load().context("Failed to load configuration")?;
    let _log_guard = logging::init(&settings)?;

    info!("QueueDesk v{} starting...", VERSION);

    // 2. Database
    let db_path = settings.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    info!(db_path = %db_path.display(), "Initializing database...");

    let pool = create_pool(&db_path.to_string_lossy())
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 3. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let id_provider: Arc<dyn IdProvider> = Arc::new(UuidProvider);
    let code_generator: Arc<dyn AccessCodeGenerator> = Arc::new(RandomAccessCodeGenerator);
    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::default());

    let staff_repo: Arc<dyn StaffRepository> = Arc::new(SqliteStaffRepository::new(pool.clone()));
    let queue_repo: Arc<dyn QueueRepository> = Arc::new(SqliteQueueRepository::new(pool.clone()));
    let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(pool.clone()));
    let entries = Arc::new(SqliteEntryRepository::new(pool.clone()));
    let entry_repo: Arc<dyn EntryRepository> = entries.clone();
    let tx_entry_repo: Arc<dyn TransactionalEntryRepository> = entries;
    let maintenance: Arc<dyn Maintenance> =
        Arc::new(SqliteMaintenance::new(pool.clone(), time_provider.clone()));

    let feed = ChangeFeed::new(DEFAULT_FEED_CAPACITY);
    let publisher: Arc<dyn ChangePublisher> = Arc::new(feed.clone());

    let policy = QueuePolicy {
        call_timeout_ms: settings.call_timeout_secs as i64 * 1000,
        minutes_per_entry: settings.minutes_per_entry,
    };

    // 4. Services
    let student = Arc::new(StudentService::new(
        tx_entry_repo,
        queue_repo.clone(),
        publisher.clone(),
        id_provider.clone(),
        time_provider.clone(),
        policy,
    ));
    let queue_state = Arc::new(QueueStateService::new(
        queue_repo.clone(),
        entry_repo.clone(),
        maintenance.clone(),
        publisher.clone(),
        time_provider.clone(),
        policy,
    ));
    let staff_admin = Arc::new(StaffAdminService::new(
        staff_repo.clone(),
        queue_repo.clone(),
        code_generator,
        publisher,
        id_provider.clone(),
        time_provider.clone(),
    ));
    let auth = Arc::new(AuthService::new(
        user_repo,
        staff_repo.clone(),
        hasher,
        id_provider.clone(),
        time_provider.clone(),
        settings.allow_admin_signup,
    ));
    let stats = Arc::new(StatsService::new(
        staff_repo,
        queue_repo.clone(),
        entry_repo,
        maintenance.clone(),
        time_provider.clone(),
    ));

    let maintenance_config = MaintenanceConfig {
        finished_entry_retention_days: settings.finished_entry_retention_days,
        max_db_size_mb: settings.max_db_size_mb,
    };
    let scheduler = Arc::new(MaintenanceScheduler::new(
        queue_state.clone(),
        maintenance,
        maintenance_config,
        Duration::from_secs(settings.sweep_interval_secs),
        Duration::from_secs(settings.maintenance_interval_hours * 3600),
    ));

    // 5. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let sessions = Arc::new(SessionRegistry::new(
        settings.session_ttl_hours as i64 * 3600 * 1000,
        id_provider,
        time_provider,
    ));
    let ctx = RpcContext {
        student,
        queue_state,
        staff_admin,
        auth,
        stats,
        maintenance: scheduler.clone(),
        queues: queue_repo,
        feed,
    };
    let rpc_config = RpcServerConfig {
        host: settings.rpc_host.clone(),
        port: settings.rpc_port,
        rate_limit_burst: settings.rate_limit_burst,
        rate_limit_per_sec: settings.rate_limit_per_sec,
    };
    let (addr, rpc_handle) = RpcServer::new(rpc_config, ctx, sessions)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 6. Start maintenance scheduler (sweep + housekeeping)
    info!("Starting maintenance scheduler...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    info!(addr = %addr, "System ready");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;
    let _ = tokio::time::timeout(Duration::from_secs(5), scheduler_handle).await;

    info!("Shutdown complete.");

    Ok(())
}
