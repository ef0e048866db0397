//! Persistence collaborator client
//!
//! The collaborator performs the actual inserts/updates; this service only speaks its
//! two request/response contracts. Status codes are opaque: 2xx is success, anything
//! else is failure carrying the response text.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CommitRequest, CommitResponse};

const USER_AGENT: &str = concat!("asana-ci/", env!("CARGO_PKG_VERSION"));
const COMMIT_PATH: &str = "/poses/import";
const ASSET_PATH: &str = "/poses/assets";

/// Collaborator client errors
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Request never completed
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response
    #[error("{0}")]
    Rejected(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

/// One asset upload request
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub batch_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Successful asset upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Identifier of the persisted record, when the collaborator returns one
    pub pose_id: Option<String>,
}

/// The two contracts the pipeline depends on
#[async_trait]
pub trait PoseCollaborator: Send + Sync {
    /// Submit a whole validated batch in one call
    async fn commit_rows(&self, request: &CommitRequest)
        -> Result<CommitResponse, CollaboratorError>;

    /// Upload one file tagged with its batch
    async fn upload_asset(&self, upload: &AssetUpload) -> Result<UploadReceipt, CollaboratorError>;
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    #[serde(default, alias = "poseId", alias = "id")]
    pose_id: Option<serde_json::Value>,
}

impl AssetResponse {
    fn into_receipt(self) -> UploadReceipt {
        let pose_id = self.pose_id.and_then(|v| match v {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        UploadReceipt { pose_id }
    }
}

/// HTTP implementation of [`PoseCollaborator`]
pub struct HttpCollaborator {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpCollaborator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CollaboratorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CollaboratorError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn rejection(response: reqwest::Response) -> CollaboratorError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        CollaboratorError::Rejected(rejection_message(status, &body))
    }
}

/// Operator-facing message for a non-success response
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status.as_u16(), body)
    }
}

#[async_trait]
impl PoseCollaborator for HttpCollaborator {
    async fn commit_rows(
        &self,
        request: &CommitRequest,
    ) -> Result<CommitResponse, CollaboratorError> {
        let url = format!("{}{}", self.base_url, COMMIT_PATH);
        tracing::debug!(url = %url, rows = request.rows.len(), "Submitting CSV commit");

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| CollaboratorError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json::<CommitResponse>()
            .await
            .map_err(|e| CollaboratorError::Parse(e.to_string()))
    }

    async fn upload_asset(&self, upload: &AssetUpload) -> Result<UploadReceipt, CollaboratorError> {
        let url = format!("{}{}", self.base_url, ASSET_PATH);
        tracing::debug!(
            url = %url,
            batch_id = %upload.batch_id,
            file_name = %upload.file_name,
            bytes = upload.data.len(),
            "Uploading asset"
        );

        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, &upload.mime_type)
            .header("X-Batch-Id", upload.batch_id.to_string())
            .header("X-File-Name", &upload.file_name)
            .body(upload.data.clone())
            .send()
            .await
            .map_err(|e| CollaboratorError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        // A success without a readable body is still a success
        let body = response.text().await.unwrap_or_default();
        if body.trim().is_empty() {
            return Ok(UploadReceipt::default());
        }
        match serde_json::from_str::<AssetResponse>(&body) {
            Ok(parsed) => Ok(parsed.into_receipt()),
            Err(e) => {
                tracing::warn!(error = %e, "Upload response was not JSON, no pose id captured");
                Ok(UploadReceipt::default())
            }
        }
    }
}
