//! Common test utilities for integration tests
//!
//! Every context owns a private in-memory database, migrated and seeded,
//! and a router built over it. Requests go through `tower::ServiceExt::oneshot`
//! so no socket is bound.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;
use volunhub_api::app::{build_router, AppState};
use volunhub_api::config::{Config, DatabaseConfig, TaskConfig};
use volunhub_shared::db::{migrations::run_migrations, pool::create_pool, seed::seed_if_empty};

/// Fixed seed so match bonuses and distances repeat between runs
pub const TEST_RNG_SEED: u64 = 7;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: SqlitePool,
    pub app: Router,
    pub config: Config,
}

impl TestContext {
    /// Fresh database with the skill vocabulary and no users
    pub async fn new() -> anyhow::Result<Self> {
        Self::build(false).await
    }

    /// Fresh database with the first-run sample data
    pub async fn with_sample_data() -> anyhow::Result<Self> {
        Self::build(true).await
    }

    async fn build(sample_data: bool) -> anyhow::Result<Self> {
        let config = Config {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
                seed_sample_data: sample_data,
            },
            tasks: TaskConfig {
                daily_limit: 5,
                match_rng_seed: Some(TEST_RNG_SEED),
            },
            ..Config::default()
        };

        let db = create_pool(config.pool_config()).await?;
        run_migrations(&db).await?;
        seed_if_empty(&db, sample_data).await?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext { db, app, config })
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// An empty body parses as `Value::Null`.
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.dispatch(request).await
    }

    /// Sends a raw body with a JSON content type
    pub async fn send_raw(&self, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.dispatch(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    /// Registers a user through the API and returns its id
    pub async fn register(&self, name: &str, email: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/auth/register",
                serde_json::json!({ "name": name, "email": email }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["id"].as_i64().expect("user id")
    }

    /// Posts a task through the API and returns the response body
    pub async fn create_task(&self, poster: i64, title: &str, description: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/tasks",
                serde_json::json!({
                    "title": title,
                    "description": description,
                    "posted_by": poster,
                    "skills": [],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body
    }
}
