//! Queued asset uploads and the per-item state machine

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

pub use asana_common::events::UploadStatus;

/// Largest file the intake filter accepts (5 MiB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Upload queue errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    /// No item with this id in the session
    #[error("Upload item not found: {0}")]
    ItemNotFound(String),

    /// Only queued items may be removed
    #[error("Upload item {id} is {status} and can no longer be removed")]
    NotRemovable { id: String, status: UploadStatus },

    /// Transition not allowed by the item lifecycle
    #[error("Invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: UploadStatus,
        to: UploadStatus,
    },

    /// A run is already driving the queue
    #[error("An upload run is already in progress (batch {0})")]
    RunInProgress(Uuid),
}

/// A file offered to intake by the picker or by drag-and-drop
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl CandidateFile {
    /// Intake filter: `image/*` at or under [`MAX_UPLOAD_BYTES`]
    pub fn is_acceptable(&self) -> bool {
        self.mime_type.trim().to_ascii_lowercase().starts_with("image/")
            && self.data.len() <= MAX_UPLOAD_BYTES
    }
}

/// Item id: file name, millisecond timestamp and a random suffix
pub fn generate_item_id(file_name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    format!("{}-{}-{}", file_name, Utc::now().timestamp_millis(), suffix)
}

/// One queued file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadItem {
    pub id: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose_id: Option<String>,
    /// Set when a run reaches the item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
    /// Local preview file, revoked when the item leaves the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_path: Option<PathBuf>,
    pub queued_at: DateTime<Utc>,
    /// File contents; released once the item is terminal
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl UploadItem {
    pub fn queued(file: CandidateFile) -> Self {
        Self {
            id: generate_item_id(&file.file_name),
            size_bytes: file.data.len(),
            file_name: file.file_name,
            mime_type: file.mime_type,
            status: UploadStatus::Queued,
            error: None,
            pose_id: None,
            batch_id: None,
            preview_path: None,
            queued_at: Utc::now(),
            data: file.data,
        }
    }

    /// Copy of the item without its file contents, for read-only views
    pub fn metadata(&self) -> Self {
        Self {
            id: self.id.clone(),
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes,
            status: self.status,
            error: self.error.clone(),
            pose_id: self.pose_id.clone(),
            batch_id: self.batch_id,
            preview_path: self.preview_path.clone(),
            queued_at: self.queued_at,
            data: Vec::new(),
        }
    }

    /// `queued → uploading`
    pub fn begin_upload(&mut self, batch_id: Uuid) -> Result<(), UploadError> {
        self.check_transition(UploadStatus::Queued, UploadStatus::Uploading)?;
        self.status = UploadStatus::Uploading;
        self.batch_id = Some(batch_id);
        Ok(())
    }

    /// `uploading → success`
    pub fn complete_success(&mut self, pose_id: Option<String>) -> Result<(), UploadError> {
        self.check_transition(UploadStatus::Uploading, UploadStatus::Success)?;
        self.status = UploadStatus::Success;
        self.pose_id = pose_id;
        self.data = Vec::new();
        Ok(())
    }

    /// `uploading → error`
    pub fn complete_error(&mut self, message: String) -> Result<(), UploadError> {
        self.check_transition(UploadStatus::Uploading, UploadStatus::Error)?;
        self.status = UploadStatus::Error;
        self.error = Some(message);
        self.data = Vec::new();
        Ok(())
    }

    fn check_transition(&self, from: UploadStatus, to: UploadStatus) -> Result<(), UploadError> {
        if self.status != from {
            return Err(UploadError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        Ok(())
    }
}
