//! Template and report export
//!
//! The template header is [`TEMPLATE_COLUMNS`], the same list the validator reads, and
//! the example row is rendered from a typed [`PoseRecord`], so the documented format
//! cannot drift from the enforced one.

use crate::models::pose_record::{encode_array, TEMPLATE_COLUMNS};
use crate::models::{PoseRecord, ValidatedRow};
use crate::models::{Difficulty, FocusArea, PoseStatus, PoseType};

/// Download name for the template
pub const TEMPLATE_FILE_NAME: &str = "pose-import-template.csv";

/// Record used as the template's example row
pub fn example_record() -> PoseRecord {
    PoseRecord {
        name: "Tree Pose".to_string(),
        sanskrit_name: Some("Vrksasana".to_string()),
        slug: Some("tree-pose".to_string()),
        image_filename: Some("tree-pose.jpg".to_string()),
        difficulty: Some(Difficulty::Beginner),
        pose_type: Some(PoseType::Balancing),
        primary_focus: Some(FocusArea::Balance),
        secondary_focus: vec![FocusArea::Legs, FocusArea::Hips],
        status: Some(PoseStatus::Draft),
        description: Some(
            "Stand on one leg, with the sole of the other foot pressed to the inner thigh."
                .to_string(),
        ),
        benefits: vec![
            "Improves balance".to_string(),
            "Strengthens ankles and legs".to_string(),
        ],
        cautions: vec!["Avoid with low blood pressure".to_string()],
        steps: vec![
            "Stand tall".to_string(),
            "Shift weight onto the left foot".to_string(),
            "Place the right foot on the inner left thigh".to_string(),
            "Bring palms together at the chest".to_string(),
        ],
        tags: vec!["balance".to_string(), "standing".to_string()],
        equipment: vec!["wall".to_string()],
    }
}

/// Template with the default example row
pub fn template_csv() -> String {
    template_csv_with(&example_record())
}

/// Header row plus one example row rendered from `example`
pub fn template_csv_with(example: &PoseRecord) -> String {
    let header = TEMPLATE_COLUMNS.join(",");
    let cells: Vec<String> = TEMPLATE_COLUMNS
        .iter()
        .map(|column| escape_cell(&record_cell(example, column)))
        .collect();
    format!("{}\n{}\n", header, cells.join(","))
}

/// One cell of `record` in import encoding
fn record_cell(record: &PoseRecord, column: &str) -> String {
    fn opt<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    match column {
        "name" => record.name.clone(),
        "sanskrit_name" => opt(&record.sanskrit_name),
        "slug" => opt(&record.slug),
        "image_filename" => opt(&record.image_filename),
        "difficulty" => opt(&record.difficulty),
        "pose_type" => opt(&record.pose_type),
        "primary_focus" => opt(&record.primary_focus),
        "secondary_focus" => {
            let labels: Vec<String> = record.secondary_focus.iter().map(ToString::to_string).collect();
            encode_array(&labels)
        }
        "status" => opt(&record.status),
        "description" => opt(&record.description),
        "benefits" => encode_array(&record.benefits),
        "cautions" => encode_array(&record.cautions),
        "steps" => encode_array(&record.steps),
        "tags" => encode_array(&record.tags),
        "equipment" => encode_array(&record.equipment),
        _ => String::new(),
    }
}

/// Quote a cell when it holds a comma, quote or line break
pub fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// `row,name,errors` listing of every invalid row, errors joined by `; `
pub fn error_report_csv(rows: &[ValidatedRow]) -> String {
    let mut out = String::from("row,name,errors\n");
    for row in rows.iter().filter(|r| !r.is_valid) {
        out.push_str(&format!(
            "{},{},{}\n",
            row.row_number(),
            escape_cell(&row.record.name),
            escape_cell(&row.errors.join("; "))
        ));
    }
    out
}
