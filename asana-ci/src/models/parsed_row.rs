//! One tokenized CSV data line

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::pose_record::{IMAGE_FILENAME, IMAGE_FILENAME_ALIAS};

/// Normalized column name → raw cell value, plus the spreadsheet row number
///
/// Every row of one batch carries the same key set (taken from the header line); a
/// missing trailing cell is stored as an empty string, never left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRow {
    /// 1-based line number as a spreadsheet shows it (first data row is 2)
    pub row_number: usize,
    pub fields: BTreeMap<String, String>,
}

impl ParsedRow {
    pub fn new(row_number: usize, fields: BTreeMap<String, String>) -> Self {
        Self { row_number, fields }
    }

    /// Raw value for `key`; empty when the column does not exist
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    /// Trimmed value for `key`, `None` when blank or absent
    pub fn value(&self, key: &str) -> Option<&str> {
        let value = self.get(key).trim();
        (!value.is_empty()).then_some(value)
    }

    /// Asset filename under either accepted header name; the primary name wins
    pub fn asset_filename(&self) -> Option<&str> {
        self.value(IMAGE_FILENAME)
            .or_else(|| self.value(IMAGE_FILENAME_ALIAS))
    }

    /// Copy of this row with the alias column folded into the canonical one
    ///
    /// Applied identically to every row of a batch, so the shared key set is preserved.
    pub fn with_canonical_keys(&self) -> ParsedRow {
        let mut fields = self.fields.clone();
        if let Some(alias) = fields.remove(IMAGE_FILENAME_ALIAS) {
            let primary = fields.entry(IMAGE_FILENAME.to_string()).or_default();
            if primary.trim().is_empty() {
                *primary = alias;
            }
        }
        ParsedRow::new(self.row_number, fields)
    }
}
