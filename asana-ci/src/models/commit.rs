//! Wire contract with the persistence collaborator

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MatchType, PoseRecord, ValidatedRow};

/// One importable row as the collaborator receives it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRow {
    pub row_number: usize,
    pub match_type: MatchType,
    #[serde(flatten)]
    pub record: PoseRecord,
}

impl From<&ValidatedRow> for CommitRow {
    fn from(row: &ValidatedRow) -> Self {
        Self {
            row_number: row.row_number(),
            match_type: row.match_type,
            record: row.record.clone(),
        }
    }
}

/// Body of the single CSV commit request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub rows: Vec<CommitRow>,
}

impl CommitRequest {
    /// Build a request from a validated batch, keeping valid rows only
    pub fn from_validated(rows: &[ValidatedRow]) -> Self {
        Self {
            rows: rows.iter().filter(|r| r.is_valid).map(CommitRow::from).collect(),
        }
    }
}

/// A row the collaborator itself rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row: usize,
    pub message: String,
}

/// Collaborator's answer to a commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResponse {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    #[serde(default)]
    pub errors: Vec<RowFailure>,
}

/// Commit outcome returned to the operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub commit_id: Uuid,
    pub rows_submitted: usize,
    /// Rows excluded before submission because they failed validation
    pub rows_skipped: usize,
    #[serde(flatten)]
    pub response: CommitResponse,
}
