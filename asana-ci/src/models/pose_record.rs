//! Typed pose record decoded from an import row

use serde::{Deserialize, Serialize};

use super::vocabulary::{Difficulty, FocusArea, PoseStatus, PoseType};

/// Canonical asset filename column
pub const IMAGE_FILENAME: &str = "image_filename";
/// Legacy spelling accepted as a synonym of [`IMAGE_FILENAME`]
pub const IMAGE_FILENAME_ALIAS: &str = "image_name";
/// Separator for array-encoded cells
pub const ARRAY_SEPARATOR: char = '|';

/// Column set the validator understands, in template order
pub const TEMPLATE_COLUMNS: [&str; 15] = [
    "name",
    "sanskrit_name",
    "slug",
    IMAGE_FILENAME,
    "difficulty",
    "pose_type",
    "primary_focus",
    "secondary_focus",
    "status",
    "description",
    "benefits",
    "cautions",
    "steps",
    "tags",
    "equipment",
];

/// Columns carrying `|`-separated lists
pub const ARRAY_COLUMNS: [&str; 6] = [
    "secondary_focus",
    "benefits",
    "cautions",
    "steps",
    "tags",
    "equipment",
];

/// Decode an array-encoded cell into trimmed, non-empty elements
///
/// An element that itself contains `|` cannot survive this encoding.
pub fn decode_array(cell: &str) -> Vec<String> {
    cell.split(ARRAY_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`decode_array`] for elements without `|`
pub fn encode_array<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| s.as_ref().trim())
        .collect::<Vec<_>>()
        .join(&ARRAY_SEPARATOR.to_string())
}

/// A pose record with explicit optional fields and decoded arrays
///
/// Enumerated fields hold `None` both when blank and when the raw value fell outside
/// the vocabulary; the latter case is always accompanied by a validation error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseRecord {
    pub name: String,
    pub sanskrit_name: Option<String>,
    pub slug: Option<String>,
    pub image_filename: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub pose_type: Option<PoseType>,
    pub primary_focus: Option<FocusArea>,
    pub secondary_focus: Vec<FocusArea>,
    pub status: Option<PoseStatus>,
    pub description: Option<String>,
    pub benefits: Vec<String>,
    pub cautions: Vec<String>,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
    pub equipment: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_array_trims_and_drops_empties() {
        assert_eq!(
            decode_array(" Stretches hips | |Calms the mind|"),
            vec!["Stretches hips", "Calms the mind"]
        );
        assert!(decode_array("").is_empty());
        assert!(decode_array(" | ").is_empty());
    }

    #[test]
    fn test_encode_array_joins_with_pipe() {
        assert_eq!(encode_array(&["mat", "block"]), "mat|block");
        assert_eq!(decode_array(&encode_array(&["mat", "block"])), vec!["mat", "block"]);
    }

    #[test]
    fn test_pipe_inside_element_is_lossy() {
        let encoded = encode_array(&["either|or"]);
        assert_eq!(decode_array(&encoded), vec!["either", "or"]);
    }

    #[test]
    fn test_every_array_column_is_a_template_column() {
        for column in ARRAY_COLUMNS {
            assert!(TEMPLATE_COLUMNS.contains(&column), "{} missing", column);
        }
    }
}
