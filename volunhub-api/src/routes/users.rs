/// User profile and impact endpoints
///
/// - `GET /api/users/:id` - Profile with skills, achievements and posted-task counts
/// - `GET /api/users/:id/impact` - A user's impact reports and totals
/// - `GET /api/impact/community` - Community totals and the hours leaderboard

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use volunhub_shared::models::{
    impact_report::{CommunityImpact, ImpactReport, UserImpact},
    user::{User, UserProfile},
};

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<UserProfile>> {
    let profile = User::profile(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", user_id)))?;

    Ok(Json(profile))
}

/// Impact of one user; an unknown user has no reports and zero totals
pub async fn user_impact(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<UserImpact>> {
    Ok(Json(ImpactReport::user_impact(&state.db, user_id).await?))
}

pub async fn community_impact(State(state): State<AppState>) -> ApiResult<Json<CommunityImpact>> {
    Ok(Json(ImpactReport::community_impact(&state.db).await?))
}
