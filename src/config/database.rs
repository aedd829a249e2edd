//! Store configuration
//!
//! Without a `url` the service keeps its state in memory, which is only
//! useful for local runs.

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// PostgreSQL connection, pool and migration settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`postgres://...`). Unset or blank selects the in-memory stores.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub migrations: MigrationConfig,
}

/// Connection pool bounds
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a handler waits for a free connection
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
}

/// Schema migration settings
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    /// Apply pending migrations before serving
    #[serde(default)]
    pub run_on_startup: bool,

    #[serde(default = "default_migrations_dir")]
    pub dir: PathBuf,
}

impl DatabaseConfig {
    /// Connection URL, if one is configured
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    /// Whether the PostgreSQL stores are in use
    pub fn is_configured(&self) -> bool {
        self.url().is_some()
    }

    /// Parsed connection options, `None` when no database is configured
    pub fn connect_options(&self) -> Result<Option<PgConnectOptions>, ValidationError> {
        self.url()
            .map(|url| {
                url.parse::<PgConnectOptions>()
                    .map_err(|e| ValidationError::InvalidDatabaseUrl(e.to_string()))
            })
            .transpose()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(url) = self.url() else {
            return Ok(());
        };
        if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
            return Err(ValidationError::InvalidDatabaseUrl(
                "expected a postgres:// URL".to_string(),
            ));
        }
        self.connect_options()?;
        self.pool.validate()
    }
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::ensure_range(
            "database.pool.max_connections",
            i64::from(self.max_connections),
            1,
            100,
        )?;
        if self.min_connections > self.max_connections {
            return Err(ValidationError::PoolBounds {
                min: self.min_connections,
                max: self.max_connections,
            });
        }
        ValidationError::ensure_range(
            "database.pool.acquire_timeout_secs",
            self.acquire_timeout_secs as i64,
            1,
            120,
        )
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            run_on_startup: false,
            dir: default_migrations_dir(),
        }
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_max_lifetime() -> u64 {
    1800
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}
