//! Database access for lingua-link
//!
//! SQLite behind a sqlx pool. Tables are created on startup if missing.

pub mod friend_requests;
pub mod test_results;
pub mod users;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create an in-memory pool, used by tests.
///
/// Each `:memory:` connection is its own database, so the pool is pinned to
/// a single connection to keep every query on the same schema.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create application tables if they don't exist.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            full_name TEXT NOT NULL,
            bio TEXT NOT NULL DEFAULT '',
            native_language TEXT NOT NULL DEFAULT '',
            learning_language TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            profile_pic TEXT NOT NULL DEFAULT '',
            is_onboarded INTEGER NOT NULL DEFAULT 0,
            is_premium INTEGER NOT NULL DEFAULT 0,
            subscription_type TEXT,
            valid_till TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Symmetric friendship set: both directions are always inserted, so
    // membership checks only ever need one direction.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS friendships (
            user_id TEXT NOT NULL,
            friend_id TEXT NOT NULL,
            PRIMARY KEY (user_id, friend_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // pair_lo/pair_hi hold the two user ids in sorted order; the unique
    // index makes "at most one request per unordered pair" a database
    // guarantee instead of a read-then-write check.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS friend_requests (
            id TEXT PRIMARY KEY,
            sender TEXT NOT NULL,
            recipient TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            pair_lo TEXT NOT NULL,
            pair_hi TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_friend_requests_pair
        ON friend_requests (pair_lo, pair_hi)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS test_results (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            topic TEXT NOT NULL,
            transcript TEXT NOT NULL,
            overall_score REAL NOT NULL,
            fluency REAL NOT NULL,
            pronunciation REAL NOT NULL,
            grammar REAL NOT NULL,
            vocabulary REAL NOT NULL,
            suggestions TEXT NOT NULL DEFAULT '[]',
            duration_in_seconds INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (users, friendships, friend_requests, test_results)");

    Ok(())
}
