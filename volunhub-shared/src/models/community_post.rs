/// Community feed posts
///
/// Free-text posts, optionally linked to a task, with a like counter that only
/// ever goes up.

use crate::db::sql_timestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Feed entry joined with its author and linked task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommunityPost {
    pub id: i64,
    pub user_id: i64,
    pub task_id: Option<i64>,
    pub content: String,
    pub image_url: String,
    pub created_at: NaiveDateTime,
    pub likes: i64,
    pub author_name: String,
    pub avatar_initials: String,
    pub is_verified: bool,
    pub task_title: Option<String>,
    pub task_duration: Option<i64>,
    pub task_location: Option<String>,
}

/// Input for creating a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommunityPost {
    pub user_id: i64,
    pub task_id: Option<i64>,
    pub content: String,
    pub image_url: String,
}

impl CommunityPost {
    /// Creates a post and returns its id
    pub async fn create(pool: &SqlitePool, data: CreateCommunityPost) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO community_posts (user_id, task_id, content, image_url, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.user_id)
        .bind(data.task_id)
        .bind(data.content)
        .bind(data.image_url)
        .bind(sql_timestamp(chrono::Utc::now().naive_utc()))
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// The feed, newest first
    pub async fn list(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CommunityPost>(
            r#"
            SELECT cp.id, cp.user_id, cp.task_id, cp.content, cp.image_url, cp.created_at, cp.likes,
                   u.name AS author_name, u.avatar_initials, u.is_verified,
                   t.title AS task_title, t.duration_minutes AS task_duration,
                   t.location_address AS task_location
            FROM community_posts cp
            JOIN users u ON cp.user_id = u.id
            LEFT JOIN tasks t ON cp.task_id = t.id
            ORDER BY cp.created_at DESC, cp.id DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Adds one like and returns the new count, or None for an unknown post
    pub async fn like(pool: &SqlitePool, id: i64) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar("UPDATE community_posts SET likes = likes + 1 WHERE id = ? RETURNING likes")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
