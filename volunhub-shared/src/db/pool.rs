/// SQLite connection pool
///
/// One pool is opened at startup and shared by every request. File databases
/// are created on first start and run in WAL mode so readers do not block the
/// writer; every connection enforces foreign keys.
///
/// `sqlite::memory:` databases live and die with their connection, so they get
/// a single connection that is never recycled.
///
/// # Example
///
/// ```no_run
/// use volunhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::default()).await?;
///
///     let row: (i64,) = sqlx::query_as("SELECT ?")
///         .bind(42i64)
///         .fetch_one(&pool)
///         .await?;
///
///     Ok(())
/// }
/// ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pool settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite://path/to/file.db` or `sqlite::memory:`
    pub url: String,

    pub max_connections: u32,

    /// How long a request may wait for a free connection
    pub connect_timeout_seconds: u64,

    /// How long a statement waits on a locked database before failing
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://volunteer_hub.db".to_string(),
            max_connections: 5,
            connect_timeout_seconds: 30,
            busy_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    /// A private in-memory database on one connection
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connect_timeout_seconds: 5,
            busy_timeout_ms: 0,
        }
    }

    /// Whether the URL names an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Opens the pool and probes it once
///
/// # Errors
///
/// Fails if the URL does not parse, the file cannot be created or opened, or
/// the probe query fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = config.is_in_memory();

    info!(
        url = %config.url,
        max_connections = config.max_connections,
        in_memory,
        "Opening SQLite pool"
    );

    let mut connect_options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

    let mut pool_options = SqlitePoolOptions::new()
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds));

    if in_memory {
        // Dropping the only connection would drop the database with it
        pool_options = pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .test_before_acquire(false);
    } else {
        connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
        pool_options = pool_options.max_connections(config.max_connections);
    }

    let pool = pool_options.connect_with(connect_options).await?;

    health_check(&pool).await?;

    debug!("SQLite pool ready");
    Ok(pool)
}

/// Probes the store with `SELECT 1`
///
/// # Errors
///
/// Returns the query error, or a protocol error if the probe answers oddly.
pub async fn health_check(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let answer: i64 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if answer != 1 {
        warn!(answer, "Database probe returned an unexpected value");
        return Err(sqlx::Error::Protocol(format!(
            "probe returned {} instead of 1",
            answer
        )));
    }

    Ok(())
}

/// Closes the pool, waiting for checked-out connections to come back
pub async fn close_pool(pool: SqlitePool) {
    pool.close().await;
    info!("SQLite pool closed");
}
