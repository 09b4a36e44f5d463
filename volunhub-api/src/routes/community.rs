/// Community feed endpoints
///
/// # Endpoints
///
/// - `GET /api/community` - Posts, newest first
/// - `POST /api/community` - Share a post
/// - `POST /api/community/:id/like` - Like a post

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
    community_post::{CommunityPost, CreateCommunityPost},
    user::User,
};

/// Create post request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(required(message = "user_id is required"))]
    pub user_id: Option<i64>,

    /// Task the post is about, if any
    pub task_id: Option<i64>,

    #[serde(default)]
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,

    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub message: String,
    pub likes: i64,
}

/// The feed with author and linked task fields
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<Vec<CommunityPost>>> {
    Ok(Json(CommunityPost::list(&state.db).await?))
}

/// Shares a post
///
/// # Errors
///
/// - 400 on missing content or author
/// - 404 if the author does not exist
/// - 400 if the linked task does not exist
pub async fn create_post(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<CreatePostResponse>)> {
    let user_id = req.user_id.unwrap_or_default();

    {
        let mut conn = state.db.acquire().await?;
        if !User::exists(&mut conn, user_id).await? {
            return Err(ApiError::NotFound(format!("User not found: {}", user_id)));
        }
    }

    let id = CommunityPost::create(
        &state.db,
        CreateCommunityPost {
            user_id,
            task_id: req.task_id,
            content: req.content,
            image_url: req.image_url,
        },
    )
    .await?;

    tracing::info!(user_id, post_id = id, "Community post created");

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            message: "Post created".to_string(),
            id,
        }),
    ))
}

/// Adds one like and returns the new count
pub async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> ApiResult<Json<LikeResponse>> {
    let likes = CommunityPost::like(&state.db, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Post not found: {}", post_id)))?;

    Ok(Json(LikeResponse {
        message: "Liked".to_string(),
        likes,
    }))
}
