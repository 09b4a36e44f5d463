use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use volunhub_shared::models::skill::Skill;

/// `GET /api/skills` - the skill vocabulary ordered by name
pub async fn list_skills(State(state): State<AppState>) -> ApiResult<Json<Vec<Skill>>> {
    Ok(Json(Skill::list(&state.db).await?))
}
