//! Shared fixtures for asana-ci integration tests
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use asana_ci::models::{CandidateFile, CommitRequest, CommitResponse, MatchType, RowFailure};
use asana_ci::services::{
    AssetUpload, CollaboratorError, PoseCollaborator, PreviewStore, UploadReceipt,
};
use asana_ci::AppState;
use asana_common::events::EventBus;
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Semaphore;

/// In-process stand-in for the persistence collaborator
///
/// Records every request. Uploads of files named in `failing_files` are rejected,
/// and commit rows whose slug is in `conflicting_slugs` are reported as failed.
#[derive(Default)]
pub struct MockCollaborator {
    failing_files: HashSet<String>,
    conflicting_slugs: HashSet<String>,
    commit_unavailable: bool,
    /// When set, each upload waits for a permit before answering
    gate: Option<Arc<Semaphore>>,
    pub uploads: Mutex<Vec<AssetUpload>>,
    pub commits: Mutex<Vec<CommitRequest>>,
}

impl MockCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.failing_files.insert(file_name.to_string());
        self
    }

    pub fn conflicting_slug(mut self, slug: &str) -> Self {
        self.conflicting_slugs.insert(slug.to_string());
        self
    }

    pub fn commit_unavailable(mut self) -> Self {
        self.commit_unavailable = true;
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn uploaded_files(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.file_name.clone())
            .collect()
    }
}

#[async_trait]
impl PoseCollaborator for MockCollaborator {
    async fn commit_rows(
        &self,
        request: &CommitRequest,
    ) -> Result<CommitResponse, CollaboratorError> {
        self.commits.lock().unwrap().push(request.clone());
        if self.commit_unavailable {
            return Err(CollaboratorError::Rejected(
                "HTTP 503: store offline".to_string(),
            ));
        }

        let mut response = CommitResponse::default();
        for row in &request.rows {
            let conflict = row
                .record
                .slug
                .as_ref()
                .is_some_and(|s| self.conflicting_slugs.contains(s));
            if conflict {
                response.failed += 1;
                response.errors.push(RowFailure {
                    row: row.row_number,
                    message: "slug already taken".to_string(),
                });
            } else if row.match_type == MatchType::New {
                response.created += 1;
            } else {
                response.updated += 1;
            }
        }
        Ok(response)
    }

    async fn upload_asset(&self, upload: &AssetUpload) -> Result<UploadReceipt, CollaboratorError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.uploads.lock().unwrap().push(upload.clone());
        if self.failing_files.contains(&upload.file_name) {
            return Err(CollaboratorError::Rejected(format!(
                "HTTP 500: cannot store {}",
                upload.file_name
            )));
        }
        Ok(UploadReceipt {
            pose_id: Some(format!("pose-{}", upload.file_name)),
        })
    }
}

/// App state over an in-memory database and a temporary preview folder
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub async fn test_app_state(collaborator: Arc<MockCollaborator>) -> (AppState, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db = asana_ci::db::init_in_memory_pool().await.unwrap();
    let previews = PreviewStore::new(temp_dir.path().join("previews"));

    let state = AppState::new(db, EventBus::new(100), collaborator, previews);
    (state, temp_dir)
}

pub fn image(file_name: &str) -> CandidateFile {
    CandidateFile {
        file_name: file_name.to_string(),
        mime_type: "image/jpeg".to_string(),
        data: file_name.as_bytes().to_vec(),
    }
}

/// Three-row CSV: valid filename match, valid slug match, invalid difficulty
pub const MIXED_CSV: &str = "\
name,slug,image_filename,difficulty,secondary_focus
Tree Pose,tree-pose,tree.jpg,Beginner,legs|hips
Crow Pose,crow-pose,,advanced,
Warrior I,warrior-one,,expert,legs
";
