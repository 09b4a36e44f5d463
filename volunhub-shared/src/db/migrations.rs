/// Embedded schema migrations
///
/// The SQL files under `volunhub-shared/migrations/` are compiled into the
/// binary, so a fresh database file is brought up to date on first start.
///
/// ```no_run
/// use volunhub_shared::db::pool::{create_pool, DatabaseConfig};
/// use volunhub_shared::db::migrations::{get_migration_status, run_migrations};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// run_migrations(&pool).await?;
///
/// let status = get_migration_status(&pool).await?;
/// assert_eq!(status.pending_migrations, 0);
/// # Ok(())
/// # }
/// ```

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, error, info};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Where a database stands relative to the embedded migrations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub applied_migrations: usize,

    /// Embedded migrations not yet recorded as applied
    pub pending_migrations: usize,

    /// Version of the newest applied migration
    pub latest_version: Option<i64>,
}

/// Applies every pending migration
///
/// # Errors
///
/// Returns the failing migration's error; that migration is rolled back.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    let embedded = MIGRATOR.iter().count();
    debug!(embedded, "Applying schema migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Schema migration failed");
        e
    })?;

    info!("Schema is up to date");
    Ok(())
}

/// Reads the migration bookkeeping table
///
/// A database that never ran migrations reports zero applied and every
/// embedded migration pending.
///
/// # Errors
///
/// Returns an error if the bookkeeping table cannot be read
pub async fn get_migration_status(pool: &SqlitePool) -> Result<MigrationStatus, sqlx::Error> {
    let embedded = MIGRATOR.iter().count();

    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    if !has_table {
        return Ok(MigrationStatus {
            applied_migrations: 0,
            pending_migrations: embedded,
            latest_version: None,
        });
    }

    let applied: Vec<i64> =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version")
            .fetch_all(pool)
            .await?;

    let pending = MIGRATOR
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .count();

    Ok(MigrationStatus {
        applied_migrations: applied.len(),
        pending_migrations: pending,
        latest_version: applied.last().copied(),
    })
}
