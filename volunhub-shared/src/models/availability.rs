/// Availability windows declared by volunteers
///
/// Windows are append-only and never checked for overlap. Dates and times are
/// kept as the strings the client sent (`YYYY-MM-DD`, `HH:MM`).

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

/// A declared free-time window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Availability {
    pub id: i64,
    pub user_id: i64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

/// Input for declaring a window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailability {
    pub user_id: i64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

impl Availability {
    /// Appends a window for an existing user
    ///
    /// Returns `None` when the user does not exist.
    pub async fn create(
        conn: &mut SqliteConnection,
        data: &CreateAvailability,
    ) -> Result<Option<i64>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO availability (user_id, date, start_time, end_time)
            SELECT ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM users WHERE id = ?)
            "#,
        )
        .bind(data.user_id)
        .bind(&data.date)
        .bind(&data.start_time)
        .bind(&data.end_time)
        .bind(data.user_id)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(result.last_insert_rowid()))
    }

    /// All windows of a user ordered by date
    pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Availability>(
            r#"
            SELECT id, user_id, date, start_time, end_time
            FROM availability
            WHERE user_id = ?
            ORDER BY date, id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Up to `limit` windows dated `today` or later, soonest first
    pub async fn upcoming_for_user(
        conn: &mut SqliteConnection,
        user_id: i64,
        today: &str,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Availability>(
            r#"
            SELECT id, user_id, date, start_time, end_time
            FROM availability
            WHERE user_id = ? AND date >= ?
            ORDER BY date, id
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(today)
        .bind(limit)
        .fetch_all(conn)
        .await
    }
}
