/// Daily posting quota
///
/// Every poster may create at most `daily_limit` tasks per trailing 24 hours.
/// The window is rolling: a post stops counting exactly 24 hours after its
/// `created_at`, not at midnight.
///
/// # Example
///
/// ```no_run
/// use volunhub_shared::quota::DailyPostQuota;
/// # use sqlx::SqlitePool;
/// # async fn example(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let quota = DailyPostQuota::new(5);
/// let mut conn = pool.acquire().await?;
///
/// let result = quota.check(&mut conn, 1).await?;
/// if result.can_post {
///     println!("{} posts left today", result.remaining);
/// }
/// # Ok(())
/// # }
/// ```

use crate::models::task::Task;
use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

/// Posts allowed per trailing 24 hours unless configured otherwise
pub const DEFAULT_DAILY_LIMIT: u32 = 5;

/// Quota enforcement error
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// Daily limit reached
    #[error("Daily post limit exceeded ({current}/{limit})")]
    LimitExceeded { limit: u32, current: u32 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaCheckResult {
    /// Posts counted in the current window
    pub posts_today: u32,

    /// Maximum posts per window
    pub daily_limit: u32,

    /// Posts left in the window
    pub remaining: u32,

    /// Whether one more post is allowed
    pub can_post: bool,
}

impl QuotaCheckResult {
    /// Builds a result from the current count
    pub fn evaluate(posts_today: u32, daily_limit: u32) -> Self {
        QuotaCheckResult {
            posts_today,
            daily_limit,
            remaining: daily_limit.saturating_sub(posts_today),
            can_post: posts_today < daily_limit,
        }
    }
}

/// Rolling 24-hour posting quota
#[derive(Debug, Clone, Copy)]
pub struct DailyPostQuota {
    daily_limit: u32,
}

impl Default for DailyPostQuota {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_LIMIT)
    }
}

impl DailyPostQuota {
    /// Creates a quota with the given daily limit
    pub fn new(daily_limit: u32) -> Self {
        DailyPostQuota { daily_limit }
    }

    /// Maximum posts per window
    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Oldest `created_at` still counted as of `now`
    pub fn window_start(&self, now: NaiveDateTime) -> NaiveDateTime {
        now - Duration::hours(24)
    }

    /// Checks a poster's quota as of now
    pub async fn check(
        &self,
        conn: &mut SqliteConnection,
        poster_id: i64,
    ) -> Result<QuotaCheckResult, QuotaError> {
        self.check_at(conn, poster_id, Utc::now().naive_utc()).await
    }

    /// Checks a poster's quota as of `now`
    ///
    /// Counts posts with `created_at >= now - 24h`.
    pub async fn check_at(
        &self,
        conn: &mut SqliteConnection,
        poster_id: i64,
        now: NaiveDateTime,
    ) -> Result<QuotaCheckResult, QuotaError> {
        let count = Task::count_posted_since(conn, poster_id, self.window_start(now)).await?;
        let posts_today = u32::try_from(count).unwrap_or(u32::MAX);

        Ok(QuotaCheckResult::evaluate(posts_today, self.daily_limit))
    }

    /// Checks a poster's quota as of `now`, failing when it is used up
    ///
    /// # Errors
    ///
    /// Returns `QuotaError::LimitExceeded` if the poster already reached the limit
    pub async fn enforce_at(
        &self,
        conn: &mut SqliteConnection,
        poster_id: i64,
        now: NaiveDateTime,
    ) -> Result<QuotaCheckResult, QuotaError> {
        let result = self.check_at(conn, poster_id, now).await?;

        if !result.can_post {
            return Err(QuotaError::LimitExceeded {
                limit: result.daily_limit,
                current: result.posts_today,
            });
        }

        Ok(result)
    }
}
