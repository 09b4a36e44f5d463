/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use volunhub_api::{app::AppState, config::Config};
/// use volunhub_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let state = AppState::new(pool, config);
/// let app = volunhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use rand::{rngs::StdRng, SeedableRng};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use volunhub_shared::lifecycle::TaskLifecycle;
use volunhub_shared::quota::DailyPostQuota;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Task create/accept/complete rules
    pub lifecycle: TaskLifecycle,

    /// Random source for match bonuses and mock distances
    pub rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    /// Creates new application state
    ///
    /// The RNG is seeded from `tasks.match_rng_seed` when set, otherwise from
    /// entropy.
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let rng = match config.tasks.match_rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let lifecycle = TaskLifecycle::new(db.clone(), DailyPostQuota::new(config.tasks.daily_limit));

        Self {
            db,
            config: Arc::new(config),
            lifecycle,
            rng: Arc::new(Mutex::new(rng)),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health
/// └── /api/
///     ├── /auth/{login,register}
///     ├── /tasks                      GET list, POST create
///     │   ├── /:id                    GET
///     │   ├── /:id/accept             POST
///     │   ├── /:id/complete           POST
///     │   ├── /posted/:id             GET
///     │   ├── /limit/:id              GET
///     │   ├── /active/:id             GET
///     │   ├── /ai-match/:id           GET
///     │   └── /cities                 GET
///     ├── /volunteers                 GET
///     ├── /availability               POST, GET /:id
///     ├── /schedule/:id               GET
///     ├── /community                  GET, POST, POST /:id/like
///     ├── /users/:id                  GET, GET /:id/impact
///     ├── /impact/community           GET
///     └── /skills                     GET
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/register", post(routes::auth::register));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks).post(routes::tasks::create_task))
        .route("/cities", get(routes::tasks::list_cities))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id/accept", post(routes::tasks::accept_task))
        .route("/:id/complete", post(routes::tasks::complete_task))
        .route("/posted/:id", get(routes::tasks::posted_tasks))
        .route("/limit/:id", get(routes::tasks::task_limit))
        .route("/active/:id", get(routes::tasks::active_tasks))
        .route("/ai-match/:id", get(routes::tasks::ai_match));

    let community_routes = Router::new()
        .route(
            "/",
            get(routes::community::list_posts).post(routes::community::create_post),
        )
        .route("/:id/like", post(routes::community::like_post));

    let user_routes = Router::new()
        .route("/:id", get(routes::users::get_user))
        .route("/:id/impact", get(routes::users::user_impact));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .nest("/community", community_routes)
        .nest("/users", user_routes)
        .route("/volunteers", get(routes::volunteers::list_volunteers))
        .route("/availability", post(routes::availability::post_availability))
        .route("/availability/:id", get(routes::availability::get_availability))
        .route("/schedule/:id", get(routes::schedule::get_schedule))
        .route("/impact/community", get(routes::users::community_impact))
        .route("/skills", get(routes::skills::list_skills));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
