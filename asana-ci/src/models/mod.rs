//! Data models for asana-ci (content import service)
//!
//! - Parsed and validated CSV rows, the typed pose record and its vocabularies
//! - Upload queue items and their lifecycle
//! - Collaborator wire contract

pub mod commit;
pub mod parsed_row;
pub mod pose_record;
pub mod upload_item;
pub mod validated_row;
pub mod vocabulary;

pub use commit::{CommitOutcome, CommitRequest, CommitResponse, CommitRow, RowFailure};
pub use parsed_row::ParsedRow;
pub use pose_record::{decode_array, encode_array, PoseRecord};
pub use upload_item::{CandidateFile, UploadError, UploadItem, UploadStatus, MAX_UPLOAD_BYTES};
pub use validated_row::{MatchType, PreviewSummary, ValidatedRow};
pub use vocabulary::{Difficulty, FocusArea, PoseStatus, PoseType, Vocabulary};
