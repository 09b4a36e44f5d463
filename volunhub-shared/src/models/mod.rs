/// Database models for the volunteer hub
///
/// This module contains all database models and their queries.
///
/// # Models
///
/// - `user`: Volunteer and organization accounts, profiles, volunteer listing
/// - `skill`: Fixed skill vocabulary and user/task skill links
/// - `task`: Volunteer tasks and their status transitions
/// - `availability`: Declared free-time windows
/// - `community_post`: Community feed with likes
/// - `achievement`: Earned badges
/// - `impact_report`: Impact reports and impact aggregation
///
/// # Example
///
/// ```no_run
/// use volunhub_shared::models::task::{Task, TaskFilter};
/// use volunhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let filter = TaskFilter {
///     city: Some("London".to_string()),
///     ..Default::default()
/// };
/// let tasks = Task::list(&pool, &filter).await?;
/// # Ok(())
/// # }
/// ```

pub mod achievement;
pub mod availability;
pub mod community_post;
pub mod impact_report;
pub mod skill;
pub mod task;
pub mod user;
