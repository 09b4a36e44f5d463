/// Achievement badges earned by users (append-only)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Achievement {
    pub id: i64,
    pub user_id: i64,
    pub badge_name: String,
    pub badge_icon: String,
    pub earned_at: NaiveDateTime,
}

impl Achievement {
    /// Records a badge for a user
    pub async fn award(
        conn: &mut SqliteConnection,
        user_id: i64,
        badge_name: &str,
        badge_icon: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO achievements (user_id, badge_name, badge_icon) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(badge_name)
        .bind(badge_icon)
        .execute(conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Lists a user's badges in the order they were earned
    pub async fn list_for_user(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Achievement>(
            r#"
            SELECT id, user_id, badge_name, badge_icon, earned_at
            FROM achievements
            WHERE user_id = ?
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
    }
}
