//! # Volunhub Shared Library
//!
//! This crate contains the data layer and task lifecycle logic used by the
//! Volunhub API server.
//!
//! ## Module Organization
//!
//! - `db`: SQLite pool, embedded migrations and sample-data seed
//! - `models`: Database models and read models
//! - `lifecycle`: Task create/accept/complete rules
//! - `quota`: Rolling daily posting limit
//! - `tagging`: Keyword-based skill suggestions
//! - `matching`: Skill-overlap task ranking

pub mod db;
pub mod lifecycle;
pub mod matching;
pub mod models;
pub mod quota;
pub mod tagging;

/// Current version of the Volunhub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
