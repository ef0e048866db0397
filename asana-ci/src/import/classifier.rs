//! Match classifier
//!
//! Decides how the collaborator should reconcile a row, from the row alone. Asset
//! filename beats slug: physical-asset identity is more authoritative than a
//! hand-edited slug.

use crate::models::{MatchType, ParsedRow};

pub fn classify(row: &ParsedRow) -> MatchType {
    if row.asset_filename().is_some() {
        MatchType::Filename
    } else if row.value("slug").is_some() {
        MatchType::Slug
    } else {
        MatchType::New
    }
}
