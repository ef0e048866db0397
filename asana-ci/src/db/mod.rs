//! Database access for asana-ci
//!
//! Local SQLite history of upload batches and CSV commits. The pose records themselves
//! live with the persistence collaborator.

pub mod batches;
pub mod commits;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the schema applied
///
/// One connection only: every `:memory:` connection is its own database.
pub async fn init_in_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(pool)
}

async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS upload_batches (
            batch_id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            total INTEGER NOT NULL DEFAULT 0,
            succeeded INTEGER NOT NULL DEFAULT 0,
            failed INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS upload_batch_items (
            item_id TEXT PRIMARY KEY,
            batch_id TEXT NOT NULL REFERENCES upload_batches(batch_id) ON DELETE CASCADE,
            file_name TEXT NOT NULL,
            status TEXT NOT NULL,
            error TEXT,
            pose_id TEXT,
            completed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS csv_commits (
            commit_id TEXT PRIMARY KEY,
            committed_at TEXT NOT NULL,
            rows_submitted INTEGER NOT NULL,
            rows_skipped INTEGER NOT NULL,
            created INTEGER NOT NULL,
            updated INTEGER NOT NULL,
            failed INTEGER NOT NULL,
            errors TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (upload_batches, upload_batch_items, csv_commits)");

    Ok(())
}
