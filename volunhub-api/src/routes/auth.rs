/// Account endpoints
///
/// Login and registration identify a user by email only. No credential is
/// checked and no token is issued; clients keep the returned user id.
///
/// # Endpoints
///
/// - `POST /api/auth/login` - Look up a user by email
/// - `POST /api/auth/register` - Create a user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidJson},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use validator::Validate;
use volunhub_shared::models::user::{CreateUser, User};

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name; initials are derived from it
    #[serde(default)]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

/// Returns the user registered under an email
///
/// # Errors
///
/// - 400 if the email is missing
/// - 404 if no user has that email
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(user))
}

/// Creates a user
///
/// # Errors
///
/// - 400 if the email is missing or already registered
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = User::create(&state.db, CreateUser::new(req.name.trim(), req.email.trim()))
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Registration rejected");
            ApiError::from(e)
        })?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}
