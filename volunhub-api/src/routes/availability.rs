/// Availability endpoints
///
/// - `POST /api/availability` - Declare a free-time window
/// - `GET /api/availability/:user_id` - A user's windows ordered by date

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use volunhub_shared::models::{
    availability::{Availability, CreateAvailability},
    skill::Skill,
};

/// Declare availability request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostAvailabilityRequest {
    #[validate(required(message = "user_id is required"))]
    pub user_id: Option<i64>,

    /// `YYYY-MM-DD`
    #[serde(default)]
    #[validate(length(min = 1, message = "date is required"))]
    pub date: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "start_time is required"))]
    pub start_time: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "end_time is required"))]
    pub end_time: String,

    /// When present, replaces the user's declared skills
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct PostAvailabilityResponse {
    pub message: String,
    pub id: i64,
}

/// Appends a window and optionally replaces the user's skills
///
/// Both writes commit together.
///
/// # Errors
///
/// - 400 on a missing field
/// - 404 if the user does not exist
pub async fn post_availability(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<PostAvailabilityRequest>,
) -> ApiResult<(StatusCode, Json<PostAvailabilityResponse>)> {
    let user_id = req.user_id.unwrap_or_default();
    let mut tx = state.db.begin().await?;

    let id = Availability::create(
        &mut tx,
        &CreateAvailability {
            user_id,
            date: req.date,
            start_time: req.start_time,
            end_time: req.end_time,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", user_id)))?;

    if let Some(skills) = &req.skills {
        Skill::replace_for_user(&mut tx, user_id, skills).await?;
    }

    tx.commit().await?;

    tracing::info!(user_id, availability_id = id, "Availability posted");

    Ok((
        StatusCode::CREATED,
        Json(PostAvailabilityResponse {
            message: "Availability posted".to_string(),
            id,
        }),
    ))
}

/// A user's windows ordered by date
pub async fn get_availability(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<Availability>>> {
    Ok(Json(Availability::list_for_user(&state.db, user_id).await?))
}
