/// Task endpoints
///
/// Creation, acceptance and completion go through `TaskLifecycle`; the
/// listings read straight from the task model.
///
/// # Endpoints
///
/// - `GET /api/tasks` - List tasks (filters: city, status, skill, user_id)
/// - `POST /api/tasks` - Post a task
/// - `GET /api/tasks/:id` - Task detail
/// - `POST /api/tasks/:id/accept` - Accept an open task
/// - `POST /api/tasks/:id/complete` - Complete a task
/// - `GET /api/tasks/posted/:user_id` - Tasks a user posted
/// - `GET /api/tasks/limit/:user_id` - Posting quota snapshot
/// - `GET /api/tasks/active/:user_id` - Tasks a volunteer holds
/// - `GET /api/tasks/cities` - Distinct task cities
/// - `GET /api/tasks/ai-match/:user_id` - Open tasks ranked for a volunteer

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidJson, ValidationErrorDetail},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use volunhub_shared::{
    lifecycle::{ActiveTasks, CompleteTask, CompletedTask, CreateTask, CreatedTask, PostedTasks},
    matching::{self, ScoredTask},
    models::task::{NewTask, Task, TaskFilter, TaskStatus, TaskSummary},
    quota::QuotaCheckResult,
};

const DEFAULT_CITY: &str = "UK";
const DEFAULT_LATITUDE: f64 = 1.3521;
const DEFAULT_LONGITUDE: f64 = 103.8198;
const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Query string for `GET /api/tasks`
///
/// Empty values are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub city: Option<String>,
    pub status: Option<String>,
    pub skill: Option<String>,
    pub user_id: Option<String>,
}

impl TaskListQuery {
    /// Converts the raw query into a typed filter
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown status or a non-numeric user id.
    pub fn into_filter(self) -> ApiResult<TaskFilter> {
        let mut details = Vec::new();

        let status = match present(self.status) {
            Some(raw) => match raw.parse::<TaskStatus>() {
                Ok(status) => Some(status),
                Err(message) => {
                    details.push(ValidationErrorDetail {
                        field: "status".to_string(),
                        message,
                    });
                    None
                }
            },
            None => None,
        };

        let user_id = match present(self.user_id) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    details.push(ValidationErrorDetail {
                        field: "user_id".to_string(),
                        message: format!("invalid user id '{}'", raw),
                    });
                    None
                }
            },
            None => None,
        };

        if !details.is_empty() {
            return Err(ApiError::ValidationError(details));
        }

        Ok(TaskFilter {
            city: present(self.city),
            status,
            skill: present(self.skill),
            user_id,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Create task request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(required(message = "posted_by is required"))]
    pub posted_by: Option<i64>,

    /// Defaults to 60
    pub duration_minutes: Option<i64>,

    #[serde(default)]
    pub location_address: String,

    /// Defaults to "UK"
    pub city: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Explicit skill names; empty asks for keyword suggestions
    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub scheduled_date: String,

    #[serde(default)]
    pub scheduled_time: String,
}

impl CreateTaskRequest {
    /// Applies defaults and builds the lifecycle input
    pub fn into_create_task(self) -> CreateTask {
        CreateTask {
            task: NewTask {
                title: self.title.trim().to_string(),
                description: self.description,
                posted_by: self.posted_by.unwrap_or_default(),
                duration_minutes: self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
                location_address: self.location_address,
                city: present(self.city).unwrap_or_else(|| DEFAULT_CITY.to_string()),
                latitude: self.latitude.unwrap_or(DEFAULT_LATITUDE),
                longitude: self.longitude.unwrap_or(DEFAULT_LONGITUDE),
                scheduled_date: self.scheduled_date,
                scheduled_time: self.scheduled_time,
            },
            skills: self.skills,
        }
    }
}

/// Accept task request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AcceptTaskRequest {
    #[validate(required(message = "user_id is required"))]
    pub user_id: Option<i64>,
}

/// Accept task response
#[derive(Debug, Serialize)]
pub struct AcceptTaskResponse {
    pub message: String,
    pub task: Task,
}

/// Complete task request
///
/// Every field is optional; `{}` completes the task as its assignee.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CompleteTaskRequest {
    pub user_id: Option<i64>,
    pub completion_photo: Option<String>,

    #[serde(alias = "completion_notes")]
    pub notes: Option<String>,
}

/// Complete task response
#[derive(Debug, Serialize)]
pub struct CompleteTaskResponse {
    pub message: String,

    #[serde(flatten)]
    pub outcome: CompletedTask,
}

/// Lists tasks matching the query filters, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Vec<TaskSummary>>> {
    let filter = query.into_filter()?;
    tracing::debug!(?filter, "Listing tasks");

    let tasks = Task::list(&state.db, &filter).await?;
    Ok(Json(tasks))
}

/// Posts a new task
///
/// # Errors
///
/// - 400 on a missing title or poster
/// - 404 if the poster does not exist
/// - 429 when the poster is at the daily limit
pub async fn create_task(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<CreatedTask>)> {
    let created = state.lifecycle.create(req.into_create_task()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Returns one task with poster fields and skills
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<TaskSummary>> {
    let task = Task::find_summary(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;

    Ok(Json(task))
}

/// Assigns an open task to a volunteer
///
/// # Errors
///
/// - 404 if the task or volunteer does not exist
/// - 409 `active_task_exists` if the volunteer already holds a task
/// - 409 `task_not_open` if the task is no longer open
pub async fn accept_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    ValidJson(req): ValidJson<AcceptTaskRequest>,
) -> ApiResult<Json<AcceptTaskResponse>> {
    let user_id = req.user_id.unwrap_or_default();
    let task = state.lifecycle.accept(task_id, user_id).await?;

    Ok(Json(AcceptTaskResponse {
        message: "Task accepted".to_string(),
        task,
    }))
}

/// Completes a task and files its impact report
///
/// # Errors
///
/// - 404 if the task or actor does not exist
/// - 409 `task_already_completed`
pub async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    ValidJson(req): ValidJson<CompleteTaskRequest>,
) -> ApiResult<Json<CompleteTaskResponse>> {
    let input = CompleteTask {
        user_id: req.user_id,
        completion_photo: req.completion_photo,
        completion_notes: req.notes,
    };
    let outcome = state.lifecycle.complete(task_id, input).await?;

    Ok(Json(CompleteTaskResponse {
        message: "Task completed".to_string(),
        outcome,
    }))
}

/// Tasks a user posted with status counts and their quota snapshot
pub async fn posted_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<PostedTasks>> {
    Ok(Json(state.lifecycle.posted_by(user_id).await?))
}

/// Posting quota snapshot for a user
pub async fn task_limit(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<QuotaCheckResult>> {
    Ok(Json(state.lifecycle.posting_limit(user_id).await?))
}

/// Tasks a volunteer currently holds
pub async fn active_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<ActiveTasks>> {
    Ok(Json(state.lifecycle.active_for(user_id).await?))
}

/// Distinct task cities, sorted
pub async fn list_cities(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(Task::cities(&state.db).await?))
}

/// Open, unassigned tasks ranked by skill overlap with a volunteer
pub async fn ai_match(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<ScoredTask>>> {
    let scored = matching::match_tasks_for(&state.db, user_id, &*state.rng).await?;

    tracing::debug!(user_id, matches = scored.len(), "Scored open tasks");

    Ok(Json(scored))
}
