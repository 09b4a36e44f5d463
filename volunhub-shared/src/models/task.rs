/// Task model and database operations
///
/// A task is a unit of requested volunteer work. Tasks are never deleted.
///
/// # State Machine
///
/// ```text
/// open → accepted → completed
/// open → completed            (completed by the poster or an explicit actor)
/// ```
///
/// `assigned_to` is set exactly when the status is `accepted` or `completed`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     title TEXT NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     posted_by INTEGER NOT NULL REFERENCES users(id),
///     assigned_to INTEGER DEFAULT NULL REFERENCES users(id),
///     status TEXT NOT NULL DEFAULT 'open',
///     duration_minutes INTEGER NOT NULL DEFAULT 60,
///     location_address TEXT NOT NULL DEFAULT '',
///     city TEXT NOT NULL DEFAULT '',
///     latitude REAL NOT NULL DEFAULT 0.0,
///     longitude REAL NOT NULL DEFAULT 0.0,
///     is_verified INTEGER NOT NULL DEFAULT 0,
///     scheduled_date TEXT NOT NULL DEFAULT '',
///     scheduled_time TEXT NOT NULL DEFAULT '',
///     completion_photo TEXT NOT NULL DEFAULT '',
///     completion_notes TEXT NOT NULL DEFAULT '',
///     created_at TEXT NOT NULL DEFAULT (datetime('now')),
///     completed_at TEXT DEFAULT NULL
/// );
/// ```
///
/// Lifecycle rules (rate limit, single active task, atomic completion) live in
/// [`crate::lifecycle`]; this module only issues the statements.

use crate::db::sql_timestamp;
use crate::models::skill::Skill;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::fmt;
use std::str::FromStr;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Posted, waiting for a volunteer
    Open,

    /// Held by a volunteer
    Accepted,

    /// Done; an impact report exists
    Completed,
}

impl TaskStatus {
    /// Converts status to its stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::Accepted => "accepted",
            TaskStatus::Completed => "completed",
        }
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        matches!(
            (self, target),
            (TaskStatus::Open, TaskStatus::Accepted)
                | (TaskStatus::Open, TaskStatus::Completed)
                | (TaskStatus::Accepted, TaskStatus::Completed)
        )
    }

    /// Checks if the task still counts against its volunteer's single active slot
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Accepted)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TaskStatus::Open),
            "accepted" => Ok(TaskStatus::Accepted),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("unknown task status '{}'", other)),
        }
    }
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,

    /// User who posted the task
    pub posted_by: i64,

    /// Volunteer holding the task (None while open)
    pub assigned_to: Option<i64>,
    pub status: TaskStatus,
    pub duration_minutes: i64,
    pub location_address: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_verified: bool,
    pub scheduled_date: String,
    pub scheduled_time: String,
    pub completion_photo: String,
    pub completion_notes: String,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

/// Input for inserting a task row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub posted_by: i64,
    pub duration_minutes: i64,
    pub location_address: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub scheduled_date: String,
    pub scheduled_time: String,
}

/// Row fields a completion reads back from the updated task
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct CompletionTarget {
    pub assigned_to: i64,
    pub duration_minutes: i64,
}

/// Task joined with poster display fields and skill names
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,
    pub poster_name: String,
    pub poster_initials: String,
    pub poster_verified: bool,
    pub poster_is_org: bool,
    #[sqlx(skip)]
    pub skills: Vec<String>,
}

/// Filters for the task listing
///
/// Every filter is optional. `city` and `status` match exactly, `user_id`
/// matches poster or assignee, and `skill` is applied after the skill join.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    pub city: Option<String>,
    pub status: Option<TaskStatus>,
    pub skill: Option<String>,
    pub user_id: Option<i64>,
}

/// Status breakdown of a poster's tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub open: i64,
    pub accepted: i64,
    pub completed: i64,
}

impl StatusCounts {
    /// Tallies the statuses of the given tasks
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a TaskStatus>) -> Self {
        let mut counts = StatusCounts::default();
        for status in statuses {
            match status {
                TaskStatus::Open => counts.open += 1,
                TaskStatus::Accepted => counts.accepted += 1,
                TaskStatus::Completed => counts.completed += 1,
            }
        }
        counts
    }
}

const TASK_COLUMNS: &str = "id, title, description, posted_by, assigned_to, status, duration_minutes, \
     location_address, city, latitude, longitude, is_verified, scheduled_date, scheduled_time, \
     completion_photo, completion_notes, created_at, completed_at";

const SUMMARY_SELECT: &str = r#"
    SELECT t.id, t.title, t.description, t.posted_by, t.assigned_to, t.status, t.duration_minutes,
           t.location_address, t.city, t.latitude, t.longitude, t.is_verified,
           t.scheduled_date, t.scheduled_time, t.completion_photo, t.completion_notes,
           t.created_at, t.completed_at,
           u.name AS poster_name, u.avatar_initials AS poster_initials,
           u.is_verified AS poster_verified, u.is_organization AS poster_is_org
    FROM tasks t
    JOIN users u ON t.posted_by = u.id
"#;

impl Task {
    /// Inserts an open task unless the poster is unknown or at the limit
    ///
    /// The poster check, the quota count and the insert are one statement, so
    /// the write lock is taken before anything is read. Returns `None` when
    /// nothing was inserted.
    pub async fn insert_within_quota(
        conn: &mut SqliteConnection,
        data: &NewTask,
        created_at: NaiveDateTime,
        window_start: NaiveDateTime,
        daily_limit: u32,
    ) -> Result<Option<i64>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (title, description, posted_by, duration_minutes, location_address,
                               city, latitude, longitude, is_verified, scheduled_date,
                               scheduled_time, created_at)
            SELECT ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM users WHERE id = ?)
              AND (SELECT COUNT(*) FROM tasks WHERE posted_by = ? AND created_at >= ?) < ?
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.posted_by)
        .bind(data.duration_minutes)
        .bind(&data.location_address)
        .bind(&data.city)
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(&data.scheduled_date)
        .bind(&data.scheduled_time)
        .bind(sql_timestamp(created_at))
        .bind(data.posted_by)
        .bind(data.posted_by)
        .bind(sql_timestamp(window_start))
        .bind(i64::from(daily_limit))
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(result.last_insert_rowid()))
    }

    /// Finds a task by ID
    pub async fn find_by_id(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Finds a task by ID with poster fields and skills
    pub async fn find_summary(
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<TaskSummary>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let summary = sqlx::query_as::<_, TaskSummary>(&format!("{SUMMARY_SELECT} WHERE t.id = ?"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match summary {
            Some(mut summary) => {
                summary.skills = Skill::names_for_task(&mut conn, id).await?;
                Ok(Some(summary))
            }
            None => Ok(None),
        }
    }

    /// Lists tasks newest first, applying the filter
    pub async fn list(pool: &SqlitePool, filter: &TaskFilter) -> Result<Vec<TaskSummary>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SUMMARY_SELECT);
        query.push(" WHERE 1 = 1");

        if let Some(city) = &filter.city {
            query.push(" AND t.city = ").push_bind(city.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND t.status = ").push_bind(status.as_str());
        }
        if let Some(user_id) = filter.user_id {
            query
                .push(" AND (t.posted_by = ")
                .push_bind(user_id)
                .push(" OR t.assigned_to = ")
                .push_bind(user_id)
                .push(")");
        }
        query.push(" ORDER BY t.created_at DESC, t.id DESC");

        let rows = query
            .build_query_as::<TaskSummary>()
            .fetch_all(&mut *conn)
            .await?;

        let mut tasks = with_skills(&mut conn, rows).await?;

        if let Some(skill) = &filter.skill {
            tasks.retain(|t| t.skills.iter().any(|s| s == skill));
        }

        Ok(tasks)
    }

    /// Tasks posted by a user, newest first
    pub async fn list_posted_by(
        pool: &SqlitePool,
        user_id: i64,
    ) -> Result<Vec<TaskSummary>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let rows = sqlx::query_as::<_, TaskSummary>(&format!(
            "{SUMMARY_SELECT} WHERE t.posted_by = ? ORDER BY t.created_at DESC, t.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        with_skills(&mut conn, rows).await
    }

    /// Tasks a volunteer currently holds, in schedule order
    pub async fn list_active_for(
        pool: &SqlitePool,
        user_id: i64,
    ) -> Result<Vec<TaskSummary>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let rows = sqlx::query_as::<_, TaskSummary>(&format!(
            "{SUMMARY_SELECT} WHERE t.assigned_to = ? AND t.status = 'accepted' \
             ORDER BY t.scheduled_date, t.scheduled_time, t.id"
        ))
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        with_skills(&mut conn, rows).await
    }

    /// Open, unassigned tasks, newest first
    pub async fn list_open_unassigned(pool: &SqlitePool) -> Result<Vec<TaskSummary>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let rows = sqlx::query_as::<_, TaskSummary>(&format!(
            "{SUMMARY_SELECT} WHERE t.status = 'open' AND t.assigned_to IS NULL \
             ORDER BY t.created_at DESC, t.id DESC"
        ))
        .fetch_all(&mut *conn)
        .await?;

        with_skills(&mut conn, rows).await
    }

    /// Tasks a user posted or holds, in schedule order
    ///
    /// Open and accepted tasks always; completed ones only when asked.
    pub async fn schedule_for(
        pool: &SqlitePool,
        user_id: i64,
        include_completed: bool,
    ) -> Result<Vec<TaskSummary>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let statuses = if include_completed {
            "('accepted', 'open', 'completed')"
        } else {
            "('accepted', 'open')"
        };

        let rows = sqlx::query_as::<_, TaskSummary>(&format!(
            "{SUMMARY_SELECT} WHERE (t.assigned_to = ? OR t.posted_by = ?) AND t.status IN {statuses} \
             ORDER BY t.scheduled_date, t.scheduled_time, t.id"
        ))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        with_skills(&mut conn, rows).await
    }

    /// Distinct non-empty cities, sorted
    pub async fn cities(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT DISTINCT city FROM tasks WHERE city != '' ORDER BY city")
            .fetch_all(pool)
            .await
    }

    /// Counts tasks a user posted at or after `since`
    pub async fn count_posted_since(
        conn: &mut SqliteConnection,
        posted_by: i64,
        since: NaiveDateTime,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE posted_by = ? AND created_at >= ?")
            .bind(posted_by)
            .bind(sql_timestamp(since))
            .fetch_one(conn)
            .await
    }

    /// Counts tasks a volunteer currently holds
    pub async fn count_active_for(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE assigned_to = ? AND status = 'accepted'")
            .bind(user_id)
            .fetch_one(conn)
            .await
    }

    /// Assigns an open task to a volunteer who holds no other accepted task
    ///
    /// The availability check and the write are one statement, so concurrent
    /// accepts by the same volunteer cannot both succeed. Returns false when
    /// nothing was updated; the caller works out why.
    pub async fn try_accept(
        conn: &mut SqliteConnection,
        id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET assigned_to = ?, status = 'accepted'
            WHERE id = ?
              AND status = 'open'
              AND NOT EXISTS (
                  SELECT 1 FROM tasks WHERE assigned_to = ? AND status = 'accepted'
              )
            "#,
        )
        .bind(user_id)
        .bind(id)
        .bind(user_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks a task completed and stores the completion artifacts
    ///
    /// An unassigned task becomes assigned to `actor_id`, or to its poster when
    /// no actor is given. An explicit `actor_id` must name an existing user.
    /// Returns `None` when the task is missing, already completed, or the actor
    /// is unknown.
    pub async fn mark_completed(
        conn: &mut SqliteConnection,
        id: i64,
        actor_id: Option<i64>,
        photo: &str,
        notes: &str,
        completed_at: NaiveDateTime,
    ) -> Result<Option<CompletionTarget>, sqlx::Error> {
        sqlx::query_as::<_, CompletionTarget>(
            r#"
            UPDATE tasks
            SET status = 'completed',
                completed_at = ?,
                completion_photo = ?,
                completion_notes = ?,
                assigned_to = COALESCE(assigned_to, ?, posted_by)
            WHERE id = ?
              AND status != 'completed'
              AND (? IS NULL OR EXISTS (SELECT 1 FROM users WHERE id = ?))
            RETURNING assigned_to, duration_minutes
            "#,
        )
        .bind(sql_timestamp(completed_at))
        .bind(photo)
        .bind(notes)
        .bind(actor_id)
        .bind(id)
        .bind(actor_id)
        .bind(actor_id)
        .fetch_optional(conn)
        .await
    }
}

async fn with_skills(
    conn: &mut SqliteConnection,
    mut rows: Vec<TaskSummary>,
) -> Result<Vec<TaskSummary>, sqlx::Error> {
    for row in &mut rows {
        row.skills = Skill::names_for_task(&mut *conn, row.task.id).await?;
    }
    Ok(rows)
}
