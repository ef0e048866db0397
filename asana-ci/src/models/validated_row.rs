//! Validation and classification results

use serde::{Deserialize, Serialize};

use super::{ParsedRow, PoseRecord};

/// Reconciliation strategy the collaborator should apply to a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Update the record that owns this asset filename
    Filename,
    /// Update the record with this slug
    Slug,
    /// Create a new record
    New,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Filename => "filename",
            MatchType::Slug => "slug",
            MatchType::New => "new",
        }
    }
}

/// A parsed row with its verdict, reasons and match type attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedRow {
    /// Row after synonym normalization
    pub row: ParsedRow,
    /// Typed view of the row
    pub record: PoseRecord,
    pub is_valid: bool,
    /// Empty iff `is_valid`
    pub errors: Vec<String>,
    pub match_type: MatchType,
}

impl ValidatedRow {
    pub fn row_number(&self) -> usize {
        self.row.row_number
    }
}

/// Counts shown above the preview table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSummary {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub by_filename: usize,
    pub by_slug: usize,
    pub new_records: usize,
}

impl PreviewSummary {
    /// Match-type counts cover valid rows only, since only those are importable
    pub fn from_rows(rows: &[ValidatedRow]) -> Self {
        let mut summary = Self {
            total_rows: rows.len(),
            ..Default::default()
        };

        for row in rows {
            if !row.is_valid {
                summary.invalid_rows += 1;
                continue;
            }
            summary.valid_rows += 1;
            match row.match_type {
                MatchType::Filename => summary.by_filename += 1,
                MatchType::Slug => summary.by_slug += 1,
                MatchType::New => summary.new_records += 1,
            }
        }

        summary
    }
}
