/// Volunteer directory
///
/// `GET /api/volunteers?skill=Gardening`

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use volunhub_shared::models::user::{User, VolunteerSummary};

#[derive(Debug, Default, Deserialize)]
pub struct VolunteerQuery {
    /// Keep only volunteers declaring this skill
    pub skill: Option<String>,
}

/// Lists volunteers with their skills, upcoming availability and a mock distance
pub async fn list_volunteers(
    State(state): State<AppState>,
    Query(query): Query<VolunteerQuery>,
) -> ApiResult<Json<Vec<VolunteerSummary>>> {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let skill = query.skill.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let volunteers = User::list_volunteers(&state.db, skill, &today, &*state.rng).await?;
    Ok(Json(volunteers))
}
