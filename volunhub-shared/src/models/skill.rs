/// Skill vocabulary and skill links
///
/// Skills are a fixed vocabulary created at bootstrap. Users and tasks are
/// linked to skills through the `user_skills` and `task_skills` join tables.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE skills (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     name TEXT UNIQUE NOT NULL
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

/// The fixed skill vocabulary, in bootstrap order
pub const SKILL_NAMES: [&str; 10] = [
    "Heavy Lifting",
    "Tech Help",
    "Gardening",
    "Transportation",
    "Cleaning",
    "Cooking",
    "Tutoring",
    "Pet Care",
    "Repairs",
    "Arts & Crafts",
];

/// A skill tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

impl Skill {
    /// Lists the whole vocabulary ordered by name
    pub async fn list(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Skill>("SELECT id, name FROM skills ORDER BY name")
            .fetch_all(pool)
            .await
    }

    /// Finds a skill by its exact name
    pub async fn find_by_name(
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Skill>("SELECT id, name FROM skills WHERE name = ?")
            .bind(name)
            .fetch_optional(conn)
            .await
    }

    /// Inserts the vocabulary, skipping names that already exist
    pub async fn ensure_vocabulary(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        for name in SKILL_NAMES {
            sqlx::query("INSERT OR IGNORE INTO skills (name) VALUES (?)")
                .bind(name)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Names of the skills linked to a task
    pub async fn names_for_task(
        conn: &mut SqliteConnection,
        task_id: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT s.name FROM skills s
            JOIN task_skills ts ON s.id = ts.skill_id
            WHERE ts.task_id = ?
            ORDER BY s.id
            "#,
        )
        .bind(task_id)
        .fetch_all(conn)
        .await
    }

    /// Names of the skills declared by a user
    pub async fn names_for_user(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT s.name FROM skills s
            JOIN user_skills us ON s.id = us.skill_id
            WHERE us.user_id = ?
            ORDER BY s.id
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
    }

    /// Links a task to the named skills
    ///
    /// Names outside the vocabulary are ignored. Returns the names that were
    /// actually linked.
    pub async fn link_task(
        conn: &mut SqliteConnection,
        task_id: i64,
        names: &[String],
    ) -> Result<Vec<String>, sqlx::Error> {
        let mut linked = Vec::with_capacity(names.len());
        for name in names {
            if let Some(skill) = Self::find_by_name(&mut *conn, name).await? {
                sqlx::query("INSERT OR IGNORE INTO task_skills (task_id, skill_id) VALUES (?, ?)")
                    .bind(task_id)
                    .bind(skill.id)
                    .execute(&mut *conn)
                    .await?;
                linked.push(skill.name);
            }
        }
        Ok(linked)
    }

    /// Replaces a user's declared skills with the named ones
    ///
    /// Names outside the vocabulary are ignored.
    pub async fn replace_for_user(
        conn: &mut SqliteConnection,
        user_id: i64,
        names: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM user_skills WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        for name in names {
            if let Some(skill) = Self::find_by_name(&mut *conn, name).await? {
                sqlx::query("INSERT OR IGNORE INTO user_skills (user_id, skill_id) VALUES (?, ?)")
                    .bind(user_id)
                    .bind(skill.id)
                    .execute(&mut *conn)
                    .await?;
            }
        }
        Ok(())
    }
}
