//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! - `PostgresSubscriptionRepository` - one row per account, upserted
//! - `PostgresPurchaseRepository` - one row per checkout item
//! - `PostgresAccountDirectory` - read-only email lookup on `accounts`
//! - `PostgresDeliveryLog` - delivery ledger keyed by event id

mod account_directory;
mod delivery_log;
mod purchase_repository;
mod subscription_repository;

pub use account_directory::PostgresAccountDirectory;
pub use delivery_log::PostgresDeliveryLog;
pub use purchase_repository::PostgresPurchaseRepository;
pub use subscription_repository::PostgresSubscriptionRepository;

use std::path::Path;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

use crate::config::PoolConfig;

/// Opens a connection pool bounded by the pool settings.
pub async fn connect(options: PgConnectOptions, pool: &PoolConfig) -> Result<PgPool, sqlx::Error> {
    let pg_pool = PgPoolOptions::new()
        .min_connections(pool.min_connections)
        .max_connections(pool.max_connections)
        .acquire_timeout(pool.acquire_timeout())
        .idle_timeout(pool.idle_timeout())
        .max_lifetime(pool.max_lifetime())
        .connect_with(options)
        .await?;

    info!(
        max_connections = pool.max_connections,
        "Connected to database"
    );
    Ok(pg_pool)
}

/// Applies the migrations found in `dir`.
pub async fn run_migrations(pool: &PgPool, dir: &Path) -> Result<(), sqlx::migrate::MigrateError> {
    let migrator = sqlx::migrate::Migrator::new(dir).await?;
    migrator.run(pool).await?;
    info!(dir = %dir.display(), "Database migrations applied");
    Ok(())
}
