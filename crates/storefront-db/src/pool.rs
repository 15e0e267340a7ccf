//! # Database Pool
//!
//! Opens the storefront SQLite database and decides how writers share it.
//!
//! ## Write Lock Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite has ONE writer at a time. Readers never wait (WAL).             │
//! │                                                                         │
//! │  begin_checkout / confirm_purchase / revert_checkout / remove_item      │
//! │       single conditional UPDATE, autocommit                             │
//! │       └── waits for the write lock up to busy_timeout                   │
//! │                                                                         │
//! │  add_item (read variant row, then UPDATE or INSERT)                     │
//! │       begin_write() → BEGIN IMMEDIATE                                   │
//! │       └── takes the write lock before the read, waits up to             │
//! │           busy_timeout; never upgrades a read lock mid-transaction      │
//! │                                                                         │
//! │  catalog snapshot                                                       │
//! │       deferred read transaction, one consistent view                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A deferred transaction that reads and then writes cannot wait for the
//! lock: SQLite fails its upgrade at once with `database is locked`. Every
//! read-then-write path goes through [`begin_write`].

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::cart::CartRepository;
use crate::repository::catalog::CatalogRepository;
use crate::repository::profile::ProfileRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives and how long writers queue for the lock.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/storefront/storefront.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    /// Default 5. In-memory databases are pinned to 1: every connection
    /// to `:memory:` would otherwise be a separate empty database.
    pub max_connections: u32,

    /// How long a writer waits for another writer's lock before the
    /// statement fails. Default 5 seconds.
    pub busy_timeout: Duration,
}

impl DbConfig {
    /// A file-backed database, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// A private database for tests.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the pool. Clones share it; repositories are handed out per call.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database and applies pending migrations.
    ///
    /// Connections run in WAL mode with foreign keys on, so a cart row can
    /// only be written for a user who has a customer profile.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let max_connections = if config.is_in_memory() {
            1
        } else {
            config.max_connections.max(1)
        };

        info!(
            path = %config.database_path.display(),
            max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Opening database"
        );

        let url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(config.busy_timeout + Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Applies pending migrations. Safe to call again.
    pub async fn run_migrations(&self) -> DbResult<()> {
        let applied = migrations::run_migrations(&self.pool).await?;
        info!(applied, "Schema up to date");
        Ok(())
    }

    /// Raw pool, for tests that go around the repositories on purpose.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The cart state machine.
    pub fn cart_items(&self) -> CartRepository {
        CartRepository::new(self.pool.clone())
    }

    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone())
    }

    pub fn profiles(&self) -> ProfileRepository {
        ProfileRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// `true` when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

/// Starts a transaction holding the write lock from its first statement.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

// =============================================================================
// Unit Tests
// =============================================================================
