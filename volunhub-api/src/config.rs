/// Configuration management for the API server
///
/// This module loads configuration from environment variables (and a `.env`
/// file if present) and provides a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 5000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `DATABASE_URL`: SQLite URL (default: sqlite://volunteer_hub.db)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
/// - `TASK_DAILY_LIMIT`: Posts per user per trailing 24 hours (default: 5)
/// - `SEED_SAMPLE_DATA`: Insert sample data into an empty database (default: true)
/// - `MATCH_RNG_SEED`: Fixed seed for match bonuses and mock distances (default: unset)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for text
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use volunhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use volunhub_shared::db::pool::DatabaseConfig as PoolConfig;
use volunhub_shared::quota::DEFAULT_DAILY_LIMIT;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Task rules
    pub tasks: TaskConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Insert sample data when the users table is empty
    pub seed_sample_data: bool,
}

/// Task rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Posts allowed per user per trailing 24 hours
    pub daily_limit: u32,

    /// Seed for the match/distance RNG; entropy when None
    pub match_rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "sqlite://volunteer_hub.db".to_string(),
                max_connections: 5,
                seed_sample_data: true,
            },
            tasks: TaskConfig {
                daily_limit: DEFAULT_DAILY_LIMIT,
                match_rng_seed: None,
            },
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through a variable lookup function
    ///
    /// Unset variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.api.cors_origins,
        };

        let daily_limit: u32 = parse_or(&lookup, "TASK_DAILY_LIMIT", defaults.tasks.daily_limit)?;
        if daily_limit == 0 {
            anyhow::bail!("TASK_DAILY_LIMIT must be at least 1");
        }

        let match_rng_seed = match lookup("MATCH_RNG_SEED") {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("MATCH_RNG_SEED has invalid value '{}'", raw))?,
            ),
            None => None,
        };

        let seed_sample_data = match lookup("SEED_SAMPLE_DATA") {
            Some(raw) => parse_bool(&raw)
                .with_context(|| format!("SEED_SAMPLE_DATA has invalid value '{}'", raw))?,
            None => defaults.database.seed_sample_data,
        };

        Ok(Self {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or(defaults.api.host),
                port: parse_or(&lookup, "API_PORT", defaults.api.port)?,
                cors_origins,
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: parse_or(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
                seed_sample_data,
            },
            tasks: TaskConfig {
                daily_limit,
                match_rng_seed,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin may call the API
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }

    /// Pool settings for the shared database layer
    ///
    /// An in-memory URL always gets a single connection.
    pub fn pool_config(&self) -> PoolConfig {
        if self.database.url.contains(":memory:") {
            return PoolConfig {
                url: self.database.url.clone(),
                ..PoolConfig::in_memory()
            };
        }

        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..PoolConfig::default()
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("expected a boolean"),
    }
}
