//! CSV commit history

use asana_common::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{CommitOutcome, CommitResponse, RowFailure};

#[derive(Debug, Clone, Serialize)]
pub struct CommitRecord {
    pub committed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: CommitOutcome,
}

/// Save a commit outcome
pub async fn save_commit(pool: &SqlitePool, outcome: &CommitOutcome) -> Result<()> {
    let errors_json = serde_json::to_string(&outcome.response.errors)
        .map_err(|e| Error::Internal(format!("Failed to serialize commit errors: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO csv_commits (
            commit_id, committed_at, rows_submitted, rows_skipped, created, updated, failed, errors
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(outcome.commit_id.to_string())
    .bind(Utc::now().to_rfc3339())
    .bind(outcome.rows_submitted as i64)
    .bind(outcome.rows_skipped as i64)
    .bind(outcome.response.created as i64)
    .bind(outcome.response.updated as i64)
    .bind(outcome.response.failed as i64)
    .bind(errors_json)
    .execute(pool)
    .await?;

    Ok(())
}

/// Commit history, newest first
pub async fn list_commits(pool: &SqlitePool, limit: u32) -> Result<Vec<CommitRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT commit_id, committed_at, rows_submitted, rows_skipped, created, updated, failed, errors
        FROM csv_commits
        ORDER BY committed_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let commit_id: String = row.get("commit_id");
            let committed_at: String = row.get("committed_at");
            let errors_json: String = row.get("errors");

            let errors: Vec<RowFailure> = serde_json::from_str(&errors_json)
                .map_err(|e| Error::Internal(format!("Failed to parse commit errors: {}", e)))?;

            Ok(CommitRecord {
                committed_at: DateTime::parse_from_rfc3339(&committed_at)
                    .map_err(|e| Error::Internal(format!("Failed to parse committed_at: {}", e)))?
                    .with_timezone(&Utc),
                outcome: CommitOutcome {
                    commit_id: Uuid::parse_str(&commit_id)
                        .map_err(|e| Error::Internal(format!("Failed to parse commit_id: {}", e)))?,
                    rows_submitted: row.get::<i64, _>("rows_submitted") as usize,
                    rows_skipped: row.get::<i64, _>("rows_skipped") as usize,
                    response: CommitResponse {
                        created: row.get::<i64, _>("created") as usize,
                        updated: row.get::<i64, _>("updated") as usize,
                        failed: row.get::<i64, _>("failed") as usize,
                        errors,
                    },
                },
            })
        })
        .collect()
}
