/// `GET /api/schedule/:user_id?include_completed=true`

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use volunhub_shared::models::task::{Task, TaskSummary};

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    /// Only the exact value `true` turns it on
    pub include_completed: Option<String>,
}

impl ScheduleQuery {
    pub fn include_completed(&self) -> bool {
        self.include_completed.as_deref() == Some("true")
    }
}

/// Tasks a user holds or posted, ordered by scheduled date and time
///
/// Completed tasks are left out unless `include_completed=true`.
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ScheduleQuery>,
) -> ApiResult<Json<Vec<TaskSummary>>> {
    let tasks = Task::schedule_for(&state.db, user_id, query.include_completed()).await?;
    Ok(Json(tasks))
}
