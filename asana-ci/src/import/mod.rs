//! CSV import pipeline
//!
//! raw text → [`tokenizer`] → [`validator`] (which runs the [`classifier`]) → preview.
//! Everything here is synchronous and pure; the commit is performed by the caller.

pub mod classifier;
pub mod template;
pub mod tokenizer;
pub mod validator;

pub use classifier::classify;
pub use template::{error_report_csv, template_csv, template_csv_with};
pub use tokenizer::{parse_csv, sniff_delimiter, TokenizeError};
pub use validator::{validate_row, validate_rows};

use crate::models::{PreviewSummary, ValidatedRow};

/// Result of running the pipeline over one file
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportPreview {
    pub summary: PreviewSummary,
    pub rows: Vec<ValidatedRow>,
}

/// Tokenize, validate and classify a whole file
pub fn preview(text: &str) -> Result<ImportPreview, TokenizeError> {
    let parsed = parse_csv(text)?;
    let rows = validate_rows(&parsed);
    let summary = PreviewSummary::from_rows(&rows);

    tracing::info!(
        total = summary.total_rows,
        valid = summary.valid_rows,
        invalid = summary.invalid_rows,
        "CSV preview built"
    );

    Ok(ImportPreview { summary, rows })
}
