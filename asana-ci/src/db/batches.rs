//! Upload batch history
//!
//! One row per "upload all" run plus one row per item that reached a terminal state,
//! so a batch can be inspected or trimmed as a unit.

use asana_common::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{UploadItem, UploadStatus};
use crate::services::upload_queue::RunSummary;

/// Persisted batch summary
#[derive(Debug, Clone, Serialize)]
pub struct BatchRecord {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// `None` while the run is active
    pub ended_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Persisted per-item outcome
#[derive(Debug, Clone, Serialize)]
pub struct BatchItemRecord {
    pub item_id: String,
    pub file_name: String,
    pub status: UploadStatus,
    pub error: Option<String>,
    pub pose_id: Option<String>,
    pub completed_at: DateTime<Utc>,
}

fn parse_time(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

fn parse_batch_id(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Failed to parse batch_id: {}", e)))
}

pub async fn insert_batch(pool: &SqlitePool, batch_id: Uuid, total: usize) -> Result<()> {
    sqlx::query("INSERT INTO upload_batches (batch_id, started_at, total) VALUES (?, ?, ?)")
        .bind(batch_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(total as i64)
        .execute(pool)
        .await?;
    Ok(())
}

/// Record an item that reached `success` or `error`
pub async fn record_item(pool: &SqlitePool, batch_id: Uuid, item: &UploadItem) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO upload_batch_items (item_id, batch_id, file_name, status, error, pose_id, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(item_id) DO UPDATE SET
            status = excluded.status,
            error = excluded.error,
            pose_id = excluded.pose_id,
            completed_at = excluded.completed_at
        "#,
    )
    .bind(&item.id)
    .bind(batch_id.to_string())
    .bind(&item.file_name)
    .bind(item.status.as_str())
    .bind(&item.error)
    .bind(&item.pose_id)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn finish_batch(pool: &SqlitePool, summary: &RunSummary) -> Result<()> {
    sqlx::query(
        "UPDATE upload_batches SET ended_at = ?, succeeded = ?, failed = ? WHERE batch_id = ?",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(summary.succeeded as i64)
    .bind(summary.failed as i64)
    .bind(summary.batch_id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

fn batch_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<BatchRecord> {
    let batch_id: String = row.get("batch_id");
    let started_at: String = row.get("started_at");
    let ended_at: Option<String> = row.get("ended_at");
    Ok(BatchRecord {
        batch_id: parse_batch_id(&batch_id)?,
        started_at: parse_time(&started_at, "started_at")?,
        ended_at: ended_at.map(|s| parse_time(&s, "ended_at")).transpose()?,
        total: row.get::<i64, _>("total") as usize,
        succeeded: row.get::<i64, _>("succeeded") as usize,
        failed: row.get::<i64, _>("failed") as usize,
    })
}

/// All batches, newest first
pub async fn list_batches(pool: &SqlitePool) -> Result<Vec<BatchRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT batch_id, started_at, ended_at, total, succeeded, failed
        FROM upload_batches
        ORDER BY started_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(batch_from_row).collect()
}

pub async fn load_batch(pool: &SqlitePool, batch_id: Uuid) -> Result<Option<BatchRecord>> {
    let row = sqlx::query(
        r#"
        SELECT batch_id, started_at, ended_at, total, succeeded, failed
        FROM upload_batches
        WHERE batch_id = ?
        "#,
    )
    .bind(batch_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(batch_from_row).transpose()
}

pub async fn load_batch_items(pool: &SqlitePool, batch_id: Uuid) -> Result<Vec<BatchItemRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT item_id, file_name, status, error, pose_id, completed_at
        FROM upload_batch_items
        WHERE batch_id = ?
        ORDER BY completed_at ASC
        "#,
    )
    .bind(batch_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let status: String = row.get("status");
            let completed_at: String = row.get("completed_at");
            Ok(BatchItemRecord {
                item_id: row.get("item_id"),
                file_name: row.get("file_name"),
                status: status.parse().map_err(Error::Internal)?,
                error: row.get("error"),
                pose_id: row.get("pose_id"),
                completed_at: parse_time(&completed_at, "completed_at")?,
            })
        })
        .collect()
}

/// Delete a batch and its items; `false` when the batch did not exist
pub async fn delete_batch(pool: &SqlitePool, batch_id: Uuid) -> Result<bool> {
    let id = batch_id.to_string();

    sqlx::query("DELETE FROM upload_batch_items WHERE batch_id = ?")
        .bind(&id)
        .execute(pool)
        .await?;
    let result = sqlx::query("DELETE FROM upload_batches WHERE batch_id = ?")
        .bind(&id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Close batches left open by a previous process
///
/// A run lives in a background task that dies with the process, so an open batch
/// found at startup will never finish.
pub async fn close_stale_batches(pool: &SqlitePool) -> Result<usize> {
    let result = sqlx::query("UPDATE upload_batches SET ended_at = ? WHERE ended_at IS NULL")
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() as usize)
}
