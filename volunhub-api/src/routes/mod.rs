/// HTTP route handlers
///
/// Handlers are grouped by resource. Each module exposes plain async
/// functions that `app::build_router` mounts.

pub mod auth;
pub mod availability;
pub mod community;
pub mod health;
pub mod schedule;
pub mod skills;
pub mod tasks;
pub mod users;
pub mod volunteers;
