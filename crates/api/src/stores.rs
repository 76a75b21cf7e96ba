//! Storage backends.
//!
//! This module contains traits and implementations for everything the service
//! persists or keeps between requests. Each store is abstracted behind a trait
//! to enable mocking in tests.
//!
//! ## Stores
//!
//! - **contents** - Shared items and per-IP view records (SQLite)
//! - **files** - Uploaded files on the local filesystem
//! - **rate_limit** - Per-IP sliding-window request counters (in memory)
//!
//! ## Tables
//!
//! ```text
//! contents       → one row per shared item, tombstoned via `deleted`
//! content_views  → (content_id, ip_address) pairs, unique
//! ```
//!
//! ## Usage in Handlers
//!
//! Stores are accessed via `state.stores`:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let item = state.stores.contents.get_active(&uuid).await?;
//!     let path = state.stores.files.save("photo.png", &bytes).await?;
//! }
//! ```

mod contents;
mod files;
mod rate_limit;

pub use contents::{ContentStore, SqliteContentStore};
pub use files::{FileStore, LocalFileStore};
pub use rate_limit::{InMemoryRateLimiter, RateLimitResult, RateLimiter};

#[cfg(test)]
pub use contents::MockContentStore;
#[cfg(test)]
pub use files::MockFileStore;
#[cfg(test)]
pub use rate_limit::MockRateLimiter;

use std::{path::Path, str::FromStr, sync::Arc};

use anyhow::Result;
use sqlx::{
    SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Collection of all stores.
#[derive(Clone)]
pub struct Stores {
    pub contents: Arc<dyn ContentStore>,
    pub files: Arc<dyn FileStore>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

/// Opens (creating if needed) the SQLite database in WAL mode.
pub async fn connect_sqlite(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let filename = options.get_filename();
    if let Some(parent) = filename.parent()
        && !parent.as_os_str().is_empty()
        && parent != Path::new(".")
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Single-connection in-memory database with the schema applied.
///
/// Every connection to `sqlite::memory:` is its own database, so the pool
/// must never open a second one or drop the first.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite");

    MIGRATOR.run(&pool).await.expect("failed to run migrations");
    pool
}
