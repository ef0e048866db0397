//! Row validator
//!
//! Each rule is checked independently and adds at most one error. A row's verdict
//! depends on nothing but that row, so a batch can be validated (or re-validated
//! after an edit) row by row. Blank optional fields are never errors.

use crate::models::pose_record::{decode_array, IMAGE_FILENAME};
use crate::models::{
    Difficulty, FocusArea, ParsedRow, PoseRecord, PoseStatus, PoseType, ValidatedRow, Vocabulary,
};

use super::classifier::classify;

/// Validate every row of a batch
pub fn validate_rows(rows: &[ParsedRow]) -> Vec<ValidatedRow> {
    rows.iter().map(validate_row).collect()
}

/// Validate, decode and classify one row
pub fn validate_row(row: &ParsedRow) -> ValidatedRow {
    let row = row.with_canonical_keys();
    let mut errors = Vec::new();

    let name = row.value("name");
    if name.is_none() {
        errors.push("Missing required field: name".to_string());
    }

    let image_filename = row.value(IMAGE_FILENAME);
    if image_filename.is_none() && name.is_none() {
        errors.push(
            "Missing identifier: provide image_filename (or image_name) or name".to_string(),
        );
    }

    let difficulty = check_scalar::<Difficulty>(&row, Difficulty::FIELD, &mut errors);
    let pose_type = check_scalar::<PoseType>(&row, PoseType::FIELD, &mut errors);
    let primary_focus = check_scalar::<FocusArea>(&row, "primary_focus", &mut errors);
    let status = check_scalar::<PoseStatus>(&row, PoseStatus::FIELD, &mut errors);
    let secondary_focus = check_list::<FocusArea>(&row, "secondary_focus", &mut errors);

    let record = PoseRecord {
        name: name.unwrap_or_default().to_string(),
        sanskrit_name: owned(row.value("sanskrit_name")),
        slug: owned(row.value("slug")),
        image_filename: owned(image_filename),
        difficulty,
        pose_type,
        primary_focus,
        secondary_focus,
        status,
        description: owned(row.value("description")),
        benefits: decode_array(row.get("benefits")),
        cautions: decode_array(row.get("cautions")),
        steps: decode_array(row.get("steps")),
        tags: decode_array(row.get("tags")),
        equipment: decode_array(row.get("equipment")),
    };

    let match_type = classify(&row);

    ValidatedRow {
        is_valid: errors.is_empty(),
        errors,
        record,
        match_type,
        row,
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

/// Check one enumerated cell; blank is fine, unknown is an error quoting the value
fn check_scalar<V: Vocabulary>(
    row: &ParsedRow,
    column: &str,
    errors: &mut Vec<String>,
) -> Option<V> {
    let raw = row.value(column)?;
    match V::parse_label(raw) {
        Some(value) => Some(value),
        None => {
            errors.push(format!(
                "Invalid {} \"{}\" (expected one of: {})",
                column,
                raw,
                V::expected()
            ));
            None
        }
    }
}

/// Check every element of an array-encoded enumerated cell
///
/// Valid elements are kept; the single error names exactly the elements that failed.
fn check_list<V: Vocabulary>(row: &ParsedRow, column: &str, errors: &mut Vec<String>) -> Vec<V> {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for element in decode_array(row.get(column)) {
        match V::parse_label(&element) {
            Some(value) => valid.push(value),
            None => invalid.push(format!("\"{}\"", element)),
        }
    }

    if !invalid.is_empty() {
        errors.push(format!(
            "Invalid {} value(s) {} (expected one of: {})",
            column,
            invalid.join(", "),
            V::expected()
        ));
    }

    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchType;
    use std::collections::BTreeMap;

    fn row(pairs: &[(&str, &str)]) -> ParsedRow {
        let fields: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ParsedRow::new(2, fields)
    }

    #[test]
    fn test_minimal_row_is_valid() {
        let v = validate_row(&row(&[("name", "Tree Pose"), ("difficulty", "")]));
        assert!(v.is_valid, "errors: {:?}", v.errors);
        assert!(v.errors.is_empty());
        assert_eq!(v.record.name, "Tree Pose");
        assert_eq!(v.record.difficulty, None);
        assert_eq!(v.match_type, MatchType::New);
    }

    #[test]
    fn test_unknown_difficulty_quotes_the_value() {
        let v = validate_row(&row(&[("name", "Crow"), ("difficulty", "expert")]));
        assert!(!v.is_valid);
        assert_eq!(v.errors.len(), 1);
        assert!(v.errors[0].contains("\"expert\""), "{}", v.errors[0]);
    }

    #[test]
    fn test_enum_match_is_case_insensitive() {
        let v = validate_row(&row(&[
            ("name", "Crow"),
            ("difficulty", "Advanced"),
            ("pose_type", "ARM_BALANCE"),
            ("status", "Published"),
        ]));
        assert!(v.is_valid, "errors: {:?}", v.errors);
        assert_eq!(v.record.difficulty, Some(Difficulty::Advanced));
        assert_eq!(v.record.pose_type, Some(PoseType::ArmBalance));
        assert_eq!(v.record.status, Some(PoseStatus::Published));
    }

    #[test]
    fn test_missing_name_and_identifier_report_separately() {
        let v = validate_row(&row(&[("name", ""), ("slug", "tree")]));
        assert!(!v.is_valid);
        assert_eq!(v.errors.len(), 2);
        assert!(v.errors[0].contains("name"));
        assert!(v.errors[1].contains("identifier"));
    }

    #[test]
    fn test_filename_satisfies_identifier_rule_but_not_name_rule() {
        let v = validate_row(&row(&[("name", ""), ("image_filename", "tree.png")]));
        assert_eq!(v.errors, vec!["Missing required field: name".to_string()]);
        assert_eq!(v.match_type, MatchType::Filename);
    }

    #[test]
    fn test_list_error_names_only_bad_elements() {
        let v = validate_row(&row(&[
            ("name", "Warrior II"),
            ("secondary_focus", "legs | wings |Hips| tail"),
        ]));
        assert!(!v.is_valid);
        assert_eq!(v.errors.len(), 1);
        let message = &v.errors[0];
        assert!(message.contains("\"wings\""));
        assert!(message.contains("\"tail\""));
        assert!(!message.contains("\"legs\""));
        assert!(!message.contains("\"Hips\""));
        assert_eq!(v.record.secondary_focus, vec![FocusArea::Legs, FocusArea::Hips]);
    }

    #[test]
    fn test_every_failing_rule_contributes_one_error() {
        let v = validate_row(&row(&[
            ("name", "X"),
            ("difficulty", "expert"),
            ("pose_type", "flying"),
            ("primary_focus", "ears"),
            ("status", "live"),
            ("secondary_focus", "nose"),
        ]));
        assert_eq!(v.errors.len(), 5);
    }

    #[test]
    fn test_alias_column_is_normalized_into_record() {
        let v = validate_row(&row(&[("name", "Tree"), ("image_name", "tree.png")]));
        assert!(v.is_valid);
        assert_eq!(v.record.image_filename.as_deref(), Some("tree.png"));
        assert_eq!(v.row.get("image_filename"), "tree.png");
        assert_eq!(v.match_type, MatchType::Filename);
    }

    #[test]
    fn test_arrays_are_decoded() {
        let v = validate_row(&row(&[
            ("name", "Tree"),
            ("benefits", "Improves balance| Strengthens legs"),
            ("equipment", ""),
        ]));
        assert_eq!(v.record.benefits, vec!["Improves balance", "Strengthens legs"]);
        assert!(v.record.equipment.is_empty());
    }
}
