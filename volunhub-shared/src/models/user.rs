/// User model and database operations
///
/// Users are volunteers or organizations. They are created on registration
/// (or by the sample-data seed) and never deleted; their accumulated stats
/// change when they complete a task.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     name TEXT NOT NULL,
///     email TEXT UNIQUE NOT NULL,
///     password_hash TEXT NOT NULL DEFAULT '',
///     avatar_initials TEXT NOT NULL DEFAULT '',
///     is_verified INTEGER NOT NULL DEFAULT 0,
///     is_organization INTEGER NOT NULL DEFAULT 0,
///     member_since TEXT NOT NULL DEFAULT '',
///     rating REAL NOT NULL DEFAULT 0.0,
///     total_hours REAL NOT NULL DEFAULT 0.0,
///     tasks_completed INTEGER NOT NULL DEFAULT 0,
///     created_at TEXT NOT NULL DEFAULT (datetime('now'))
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use volunhub_shared::models::user::{User, CreateUser};
/// use volunhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser::new("Jane Roe", "jane@example.com")).await?;
/// assert_eq!(user.avatar_initials, "JR");
///
/// let found = User::find_by_email(&pool, "jane@example.com").await?;
/// # Ok(())
/// # }
/// ```

use crate::models::achievement::Achievement;
use crate::models::skill::Skill;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

const USER_COLUMNS: &str = "id, name, email, avatar_initials, is_verified, is_organization, \
     member_since, rating, total_hours, tasks_completed, created_at";

/// User account
///
/// `password_hash` is never loaded; credentials are not checked.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub avatar_initials: String,

    /// Trusted account (badge shown next to the name)
    pub is_verified: bool,

    /// Organizations post tasks and are excluded from volunteer listings
    pub is_organization: bool,

    /// Display string such as "January 2026"
    pub member_since: String,
    pub rating: f64,
    pub total_hours: f64,
    pub tasks_completed: i64,
    pub created_at: NaiveDateTime,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub avatar_initials: String,
    pub member_since: String,
}

impl CreateUser {
    /// Builds registration input, deriving initials and the member-since month
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            avatar_initials: initials(&name),
            member_since: Utc::now().format("%B %Y").to_string(),
            name,
            email: email.into(),
        }
    }
}

/// First letter of the first two words, uppercased; "??" for an empty name
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();

    if letters.is_empty() {
        "??".to_string()
    } else {
        letters
    }
}

/// Counts of tasks a user has posted, broken down by status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostedTaskCounts {
    pub total_posted: i64,
    pub open_posted: i64,
    pub accepted_posted: i64,
    pub completed_posted: i64,
}

/// User profile read model
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub skills: Vec<String>,
    pub achievements: Vec<Achievement>,
    pub posted_tasks: PostedTaskCounts,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation when the email is taken.
    pub async fn create(pool: &SqlitePool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO users (name, email, avatar_initials, member_since)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.avatar_initials)
        .bind(&data.member_since)
        .execute(pool)
        .await?
        .last_insert_rowid();

        let mut conn = pool.acquire().await?;
        Self::find_by_id(&mut conn, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds a user by ID
    pub async fn find_by_id(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Finds a user by email (exact match)
    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Checks whether a user exists
    pub async fn exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = ?)")
            .bind(id)
            .fetch_one(conn)
            .await
    }

    /// Adds completed-task stats to a user
    ///
    /// Returns false when no such user exists.
    pub async fn record_completion(
        conn: &mut SqliteConnection,
        id: i64,
        hours: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET total_hours = total_hours + ?,
                tasks_completed = tasks_completed + 1
            WHERE id = ?
            "#,
        )
        .bind(hours)
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts the tasks this user has posted by status
    pub async fn posted_task_counts(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<PostedTaskCounts, sqlx::Error> {
        sqlx::query_as::<_, PostedTaskCounts>(
            r#"
            SELECT
                COUNT(*) AS total_posted,
                COALESCE(SUM(CASE WHEN status = 'open' THEN 1 ELSE 0 END), 0) AS open_posted,
                COALESCE(SUM(CASE WHEN status = 'accepted' THEN 1 ELSE 0 END), 0) AS accepted_posted,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed_posted
            FROM tasks
            WHERE posted_by = ?
            "#,
        )
        .bind(id)
        .fetch_one(conn)
        .await
    }

    /// Loads a user with skills, achievements and posted-task breakdown
    pub async fn profile(pool: &SqlitePool, id: i64) -> Result<Option<UserProfile>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let Some(user) = Self::find_by_id(&mut conn, id).await? else {
            return Ok(None);
        };

        let skills = Skill::names_for_user(&mut conn, id).await?;
        let achievements = Achievement::list_for_user(&mut conn, id).await?;
        let posted_tasks = Self::posted_task_counts(&mut conn, id).await?;

        Ok(Some(UserProfile {
            user,
            skills,
            achievements,
            posted_tasks,
        }))
    }
}

/// Volunteer listing row
#[derive(Debug, Clone, Serialize)]
pub struct VolunteerSummary {
    #[serde(flatten)]
    pub user: User,
    pub skills: Vec<String>,
    pub availability: Vec<crate::models::availability::Availability>,

    /// Mock distance, uniform in [0.2, 5.0] km
    pub distance_km: f64,
}

#[derive(sqlx::FromRow)]
struct VolunteerRow {
    #[sqlx(flatten)]
    user: User,
    skill_names: Option<String>,
}

impl User {
    /// Lists volunteers (non-organizations) with skills and upcoming availability
    ///
    /// `skill` filters after the join: only volunteers declaring that exact
    /// skill are kept. Distances come from `rng`.
    pub async fn list_volunteers<R: rand::Rng>(
        pool: &SqlitePool,
        skill: Option<&str>,
        today: &str,
        rng: &std::sync::Mutex<R>,
    ) -> Result<Vec<VolunteerSummary>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let rows = sqlx::query_as::<_, VolunteerRow>(
            r#"
            SELECT u.id, u.name, u.email, u.avatar_initials, u.is_verified, u.is_organization,
                   u.member_since, u.rating, u.total_hours, u.tasks_completed, u.created_at,
                   GROUP_CONCAT(DISTINCT s.name) AS skill_names
            FROM users u
            LEFT JOIN user_skills us ON u.id = us.user_id
            LEFT JOIN skills s ON us.skill_id = s.id
            WHERE u.is_organization = 0
            GROUP BY u.id
            ORDER BY u.id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut volunteers = Vec::with_capacity(rows.len());
        for row in rows {
            let skills: Vec<String> = row
                .skill_names
                .as_deref()
                .map(|names| names.split(',').map(str::to_string).collect())
                .unwrap_or_default();

            if let Some(wanted) = skill {
                if !skills.iter().any(|s| s == wanted) {
                    continue;
                }
            }

            let availability = crate::models::availability::Availability::upcoming_for_user(
                &mut conn,
                row.user.id,
                today,
                3,
            )
            .await?;

            let distance_km = {
                let mut rng = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                mock_distance_km(&mut *rng)
            };

            volunteers.push(VolunteerSummary {
                user: row.user,
                skills,
                availability,
                distance_km,
            });
        }

        Ok(volunteers)
    }
}

/// Random distance in [0.2, 5.0] km rounded to one decimal
pub fn mock_distance_km<R: rand::Rng>(rng: &mut R) -> f64 {
    let raw: f64 = rng.gen_range(0.2..=5.0);
    (raw * 10.0).round() / 10.0
}
