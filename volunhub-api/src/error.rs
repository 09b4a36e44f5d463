/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `ApiResult<T>` which automatically converts to
/// appropriate HTTP status codes.
///
/// Every error body has the same shape:
///
/// ```json
/// { "error": "not_found", "message": "Task not found: 7" }
/// ```
///
/// Validation errors add `details`; rate-limit errors add `posts_today`,
/// `daily_limit` and `remaining`.
///
/// # Example
///
/// ```no_run
/// use volunhub_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::NotFound("User not found".to_string()))
/// }
/// ```

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use validator::Validate;
use volunhub_shared::lifecycle::LifecycleError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400), e.g. malformed JSON or duplicate email
    BadRequest(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) with a machine-readable code
    Conflict { code: &'static str, message: String },

    /// Validation errors (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Daily posting limit reached (429)
    RateLimitExceeded {
        posts_today: u32,
        daily_limit: u32,
        message: String,
    },

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "task_not_open")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts_today: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

impl ErrorResponse {
    fn new(error: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message,
            details: None,
            posts_today: None,
            daily_limit: None,
            remaining: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::RateLimitExceeded { message, .. } => {
                write!(f, "Rate limit exceeded: {}", message)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ApiError::BadRequest(msg) => ErrorResponse::new("bad_request", msg),
            ApiError::NotFound(msg) => ErrorResponse::new("not_found", msg),
            ApiError::Conflict { code, message } => ErrorResponse::new(code, message),
            ApiError::ValidationError(errors) => ErrorResponse {
                details: Some(errors),
                ..ErrorResponse::new("validation_error", "Request validation failed".to_string())
            },
            ApiError::RateLimitExceeded {
                posts_today,
                daily_limit,
                message,
            } => ErrorResponse {
                posts_today: Some(posts_today),
                daily_limit: Some(daily_limit),
                remaining: Some(daily_limit.saturating_sub(posts_today)),
                ..ErrorResponse::new("rate_limit_exceeded", message)
            },
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ErrorResponse::new("internal_error", "An internal error occurred".to_string())
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    if db_err.message().contains("email") {
                        return ApiError::BadRequest("Email already registered".to_string());
                    }
                    return ApiError::BadRequest("Duplicate value".to_string());
                }
                if db_err.is_foreign_key_violation() {
                    return ApiError::BadRequest("Referenced record does not exist".to_string());
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert lifecycle errors to API errors
impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        let message = err.to_string();
        match err {
            LifecycleError::TaskNotFound(_) | LifecycleError::UserNotFound(_) => {
                ApiError::NotFound(message)
            }
            LifecycleError::RateLimited {
                posts_today,
                daily_limit,
            } => ApiError::RateLimitExceeded {
                posts_today,
                daily_limit,
                message: format!(
                    "Daily task limit reached. You can post {} tasks per day.",
                    daily_limit
                ),
            },
            LifecycleError::ActiveTaskExists { .. } => ApiError::Conflict {
                code: "active_task_exists",
                message,
            },
            LifecycleError::TaskNotOpen(_) => ApiError::Conflict {
                code: "task_not_open",
                message,
            },
            LifecycleError::TaskAlreadyCompleted(_) => ApiError::Conflict {
                code: "task_already_completed",
                message,
            },
            LifecycleError::Database(err) => err.into(),
        }
    }
}

/// Convert validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(errors)
    }
}

/// Convert JSON body rejections to API errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor that validates the payload
///
/// Malformed bodies and failed validation both produce the JSON error shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}
