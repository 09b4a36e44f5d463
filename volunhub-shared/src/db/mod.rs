/// Database layer for the volunteer hub
///
/// This module provides connection pooling, migrations and the sample-data
/// seed. Models are in the `models` module at crate root level.
///
/// # Modules
///
/// - `pool`: SQLite connection pool management with health checks
/// - `migrations`: Embedded schema migrations
/// - `seed`: Skill vocabulary and first-run sample data
///
/// # Example
///
/// ```no_run
/// use volunhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
pub mod seed;

use chrono::NaiveDateTime;

/// Formats a timestamp the way rows store it
///
/// Matches SQLite's `datetime('now')` layout (plus milliseconds), so stored
/// timestamps compare correctly as text.
pub fn sql_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}
