//! Delimiter-sniffing CSV tokenizer
//!
//! Targets the fixed pose-record shape, not general RFC 4180 input:
//! - Lines split on `\n` (a trailing `\r` is dropped), blank lines discarded
//! - One delimiter per file, sniffed from the header line only
//! - `"` toggles quote mode, `""` inside quotes is a literal quote
//!
//! A file whose header holds no delimiter but whose data rows do is parsed as
//! single-column comma data. Known limitation of header-only sniffing.
//!
//! Row numbers count non-blank lines only: the header is row 1 and each data line
//! that survives blank-line removal takes the next number. A file with blank lines
//! between records will therefore number rows lower than a spreadsheet does.

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::models::ParsedRow;

/// Delimiters in priority order
const DELIMITER_PRIORITY: [char; 3] = ['\t', ';', ','];

/// Structural failures that halt the pipeline before validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenizeError {
    /// No non-blank lines at all
    #[error("CSV file is empty")]
    Empty,

    /// Header present but nothing to import
    #[error("CSV file has a header row but no data rows")]
    NoDataRows,

    /// Two header cells normalize to the same column key
    #[error("CSV header repeats column \"{0}\"")]
    DuplicateColumn(String),
}

/// Pick the delimiter for a whole file from its header line
///
/// The first of tab, semicolon, comma that occurs at all wins; a header with none of
/// them defaults to comma.
pub fn sniff_delimiter(header: &str) -> char {
    DELIMITER_PRIORITY
        .iter()
        .copied()
        .find(|d| header.contains(*d))
        .unwrap_or(',')
}

/// Split one line into raw (untrimmed) cells
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);

    fields
}

/// Header cell → column key: trimmed, lower-cased, whitespace runs → `_`
pub fn normalize_header(cell: &str) -> String {
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Tokenize a whole file into rows keyed by normalized header
///
/// Cells beyond the header width are ignored; missing trailing cells become `""`.
/// Row numbers start at 2 and skip blank lines (see module docs).
pub fn parse_csv(text: &str) -> Result<Vec<ParsedRow>, TokenizeError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.trim().is_empty())
        .collect();

    let Some((header_line, data_lines)) = lines.split_first() else {
        return Err(TokenizeError::Empty);
    };
    if data_lines.is_empty() {
        return Err(TokenizeError::NoDataRows);
    }

    let delimiter = sniff_delimiter(header_line);
    let headers: Vec<String> = split_line(header_line, delimiter)
        .iter()
        .map(|h| normalize_header(h))
        .collect();

    // Blank header cells name no column and may repeat
    let mut seen = BTreeSet::new();
    for key in headers.iter().filter(|k| !k.is_empty()) {
        if !seen.insert(key.as_str()) {
            return Err(TokenizeError::DuplicateColumn(key.clone()));
        }
    }

    tracing::debug!(
        delimiter = ?delimiter,
        columns = headers.len(),
        rows = data_lines.len(),
        "CSV tokenized"
    );

    let rows = data_lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let cells = split_line(line, delimiter);
            let fields: BTreeMap<String, String> = headers
                .iter()
                .enumerate()
                .map(|(i, key)| {
                    let value = cells.get(i).map(|c| c.trim().to_string()).unwrap_or_default();
                    (key.clone(), value)
                })
                .collect();
            ParsedRow::new(index + 2, fields)
        })
        .collect();

    Ok(rows)
}
