/// Task lifecycle service
///
/// Enforces the rules around the task state machine:
///
/// - **Create**: poster must exist and be under the daily posting quota; a task
///   posted without skills is tagged from its text.
/// - **Accept**: a volunteer holds at most one accepted task at a time. The
///   check and the assignment are a single conditional update.
/// - **Complete**: status change, impact report and the actor's stats are
///   written in one transaction.
///
/// # Example
///
/// ```no_run
/// use volunhub_shared::lifecycle::{CompleteTask, TaskLifecycle};
/// use volunhub_shared::quota::DailyPostQuota;
/// # use sqlx::SqlitePool;
/// # async fn example(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let lifecycle = TaskLifecycle::new(pool, DailyPostQuota::new(5));
///
/// lifecycle.accept(7, 2).await?;
/// let done = lifecycle.complete(7, CompleteTask::default()).await?;
/// println!("logged {} hours", done.hours_logged);
/// # Ok(())
/// # }
/// ```

use crate::models::impact_report::{CreateImpactReport, ImpactReport};
use crate::models::skill::Skill;
use crate::models::task::{NewTask, StatusCounts, Task, TaskStatus, TaskSummary};
use crate::models::user::User;
use crate::quota::{DailyPostQuota, QuotaCheckResult, QuotaError};
use crate::tagging::suggest_skills;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Notes stored when a completion carries none
pub const DEFAULT_COMPLETION_NOTES: &str = "Task completed";

/// Task lifecycle error
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// Poster reached the daily posting limit
    #[error("Daily task limit reached ({posts_today}/{daily_limit})")]
    RateLimited { posts_today: u32, daily_limit: u32 },

    /// Volunteer already holds an accepted task
    #[error("You already have an active task. Complete it before accepting another.")]
    ActiveTaskExists { user_id: i64 },

    #[error("Task {0} is not open")]
    TaskNotOpen(i64),

    #[error("Task {0} is already completed")]
    TaskAlreadyCompleted(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<QuotaError> for LifecycleError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::LimitExceeded { limit, current } => LifecycleError::RateLimited {
                posts_today: current,
                daily_limit: limit,
            },
            QuotaError::Database(err) => LifecycleError::Database(err),
        }
    }
}

/// Input for posting a task
///
/// Defaults are applied by the caller; an empty `skills` list asks for
/// suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    #[serde(flatten)]
    pub task: NewTask,
    pub skills: Vec<String>,
}

/// A freshly posted task
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTask {
    #[serde(flatten)]
    pub task: TaskSummary,

    /// The skill list that was applied (explicit or suggested)
    pub ai_suggested_skills: Vec<String>,
}

/// Input for completing a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteTask {
    /// Explicit actor; defaults to the assignee, then the poster
    pub user_id: Option<i64>,
    pub completion_photo: Option<String>,
    pub completion_notes: Option<String>,
}

/// Outcome of a completion
#[derive(Debug, Clone, Serialize)]
pub struct CompletedTask {
    pub task_id: i64,
    pub status: TaskStatus,
    pub completed_by: i64,
    pub impact_report_id: i64,
    pub hours_logged: f64,
    pub carbon_saved_kg: f64,
}

/// Tasks a user posted, with counts and their quota snapshot
#[derive(Debug, Clone, Serialize)]
pub struct PostedTasks {
    pub tasks: Vec<TaskSummary>,
    pub total: usize,
    pub status_counts: StatusCounts,
    pub posts_today: u32,
    pub daily_limit: u32,
    pub can_post: bool,
}

/// Tasks a volunteer currently holds
#[derive(Debug, Clone, Serialize)]
pub struct ActiveTasks {
    pub active_tasks: Vec<TaskSummary>,
    pub count: usize,
    pub has_active: bool,
}

/// Task lifecycle service
#[derive(Debug, Clone)]
pub struct TaskLifecycle {
    db: SqlitePool,
    quota: DailyPostQuota,
}

impl TaskLifecycle {
    /// Creates a lifecycle service over a pool
    pub fn new(db: SqlitePool, quota: DailyPostQuota) -> Self {
        TaskLifecycle { db, quota }
    }

    /// Posting quota in effect
    pub fn quota(&self) -> DailyPostQuota {
        self.quota
    }

    /// Posts a new open task
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the poster does not exist
    /// - `RateLimited` if the poster is at the daily limit
    pub async fn create(&self, input: CreateTask) -> Result<CreatedTask, LifecycleError> {
        self.create_at(input, Utc::now().naive_utc()).await
    }

    /// Posts a new open task as of `now`
    pub async fn create_at(
        &self,
        input: CreateTask,
        now: NaiveDateTime,
    ) -> Result<CreatedTask, LifecycleError> {
        let poster_id = input.task.posted_by;

        let applied = if input.skills.is_empty() {
            suggest_skills(&input.task.title, &input.task.description)
        } else {
            input.skills
        };

        let mut tx = self.db.begin().await?;

        // First statement writes, so the transaction holds the write lock from here on
        let inserted = Task::insert_within_quota(
            &mut tx,
            &input.task,
            now,
            self.quota.window_start(now),
            self.quota.daily_limit(),
        )
        .await?;

        let Some(task_id) = inserted else {
            let err = if !User::exists(&mut tx, poster_id).await? {
                LifecycleError::UserNotFound(poster_id)
            } else {
                match self.quota.enforce_at(&mut tx, poster_id, now).await {
                    Err(err) => err.into(),
                    Ok(result) => LifecycleError::RateLimited {
                        posts_today: result.posts_today,
                        daily_limit: result.daily_limit,
                    },
                }
            };
            warn!(user_id = poster_id, error = %err, "Task creation rejected");
            return Err(err);
        };

        let linked = Skill::link_task(&mut tx, task_id, &applied).await?;

        tx.commit().await?;

        info!(
            task_id,
            user_id = poster_id,
            skills = ?linked,
            "Task created"
        );

        let task = Task::find_summary(&self.db, task_id)
            .await?
            .ok_or(LifecycleError::TaskNotFound(task_id))?;

        Ok(CreatedTask {
            task,
            ai_suggested_skills: applied,
        })
    }

    /// Assigns an open task to a volunteer
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the volunteer does not exist
    /// - `ActiveTaskExists` if the volunteer already holds an accepted task
    /// - `TaskNotFound` if the task does not exist
    /// - `TaskNotOpen` if the task was already accepted or completed
    pub async fn accept(&self, task_id: i64, user_id: i64) -> Result<Task, LifecycleError> {
        let mut conn = self.db.acquire().await?;

        if !User::exists(&mut conn, user_id).await? {
            return Err(LifecycleError::UserNotFound(user_id));
        }

        if Task::try_accept(&mut conn, task_id, user_id).await? {
            info!(task_id, user_id, "Task accepted");
            return Task::find_by_id(&mut conn, task_id)
                .await?
                .ok_or(LifecycleError::TaskNotFound(task_id));
        }

        // Nothing was updated; work out which rule blocked it
        let err = if Task::count_active_for(&mut conn, user_id).await? > 0 {
            LifecycleError::ActiveTaskExists { user_id }
        } else {
            match Task::find_by_id(&mut conn, task_id).await? {
                None => LifecycleError::TaskNotFound(task_id),
                Some(_) => LifecycleError::TaskNotOpen(task_id),
            }
        };

        warn!(task_id, user_id, error = %err, "Task accept rejected");
        Err(err)
    }

    /// Completes a task and records its impact
    ///
    /// The actor is `input.user_id`, else the assignee, else the poster. Their
    /// `total_hours` grows by `duration_minutes / 60` and `tasks_completed` by one.
    ///
    /// # Errors
    ///
    /// - `TaskNotFound` if the task does not exist
    /// - `TaskAlreadyCompleted` if it was completed before
    /// - `UserNotFound` if the explicit actor does not exist
    pub async fn complete(
        &self,
        task_id: i64,
        input: CompleteTask,
    ) -> Result<CompletedTask, LifecycleError> {
        let now = Utc::now().naive_utc();
        let photo = input.completion_photo.unwrap_or_default();
        let notes = input
            .completion_notes
            .unwrap_or_else(|| DEFAULT_COMPLETION_NOTES.to_string());

        let mut tx = self.db.begin().await?;

        let completed =
            Task::mark_completed(&mut tx, task_id, input.user_id, &photo, &notes, now).await?;

        let Some(target) = completed else {
            let err = match Task::find_by_id(&mut tx, task_id).await? {
                None => LifecycleError::TaskNotFound(task_id),
                Some(task) if !task.status.can_transition_to(TaskStatus::Completed) => {
                    LifecycleError::TaskAlreadyCompleted(task_id)
                }
                Some(_) => LifecycleError::UserNotFound(input.user_id.unwrap_or_default()),
            };
            warn!(task_id, error = %err, "Task completion rejected");
            return Err(err);
        };

        let actor_id = input.user_id.unwrap_or(target.assigned_to);

        let report =
            CreateImpactReport::for_completed_task(actor_id, task_id, target.duration_minutes, &notes);
        let impact_report_id = ImpactReport::create(&mut tx, &report).await?;
        User::record_completion(&mut tx, actor_id, report.hours_logged).await?;

        tx.commit().await?;

        info!(
            task_id,
            user_id = actor_id,
            hours = report.hours_logged,
            "Task completed"
        );

        Ok(CompletedTask {
            task_id,
            status: TaskStatus::Completed,
            completed_by: actor_id,
            impact_report_id,
            hours_logged: report.hours_logged,
            carbon_saved_kg: report.carbon_saved_kg,
        })
    }

    /// Current quota snapshot for a poster
    pub async fn posting_limit(&self, user_id: i64) -> Result<QuotaCheckResult, LifecycleError> {
        let mut conn = self.db.acquire().await?;
        Ok(self.quota.check(&mut conn, user_id).await?)
    }

    /// Tasks a user posted, with status counts and quota snapshot
    pub async fn posted_by(&self, user_id: i64) -> Result<PostedTasks, LifecycleError> {
        let tasks = Task::list_posted_by(&self.db, user_id).await?;
        let limit = self.posting_limit(user_id).await?;

        Ok(PostedTasks {
            total: tasks.len(),
            status_counts: StatusCounts::tally(tasks.iter().map(|t| &t.task.status)),
            tasks,
            posts_today: limit.posts_today,
            daily_limit: limit.daily_limit,
            can_post: limit.can_post,
        })
    }

    /// Tasks a volunteer currently holds
    pub async fn active_for(&self, user_id: i64) -> Result<ActiveTasks, LifecycleError> {
        let active_tasks = Task::list_active_for(&self.db, user_id).await?;

        Ok(ActiveTasks {
            count: active_tasks.len(),
            has_active: !active_tasks.is_empty(),
            active_tasks,
        })
    }
}
