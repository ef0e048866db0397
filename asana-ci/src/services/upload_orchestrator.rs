//! Sequential upload orchestrator
//!
//! Owns the session's [`UploadQueue`] and drives one run at a time: mint a batch id,
//! upload each queued item in array order, record its outcome, then report the batch.
//! The queue lock is never held across a collaborator call, so the operator can keep
//! adding and removing queued items while a run is in flight.

use std::sync::Arc;

use asana_common::events::{EventBus, ImportEvent};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::collaborator::PoseCollaborator;
use super::preview_store::PreviewStore;
use super::upload_queue::{filter_intake, RunStart, RunSummary, UploadQueue};
use crate::db::batches;
use crate::models::{CandidateFile, UploadError, UploadItem, UploadStatus};

/// Visible state of the upload session
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub items: Vec<UploadItem>,
    /// Batch currently being driven, if any
    pub active_batch: Option<Uuid>,
}

#[derive(Clone)]
pub struct UploadOrchestrator {
    queue: Arc<Mutex<UploadQueue>>,
    collaborator: Arc<dyn PoseCollaborator>,
    previews: PreviewStore,
    event_bus: EventBus,
    db: SqlitePool,
}

impl UploadOrchestrator {
    pub fn new(
        collaborator: Arc<dyn PoseCollaborator>,
        previews: PreviewStore,
        event_bus: EventBus,
        db: SqlitePool,
    ) -> Self {
        Self {
            queue: Arc::new(Mutex::new(UploadQueue::new())),
            collaborator,
            previews,
            event_bus,
            db,
        }
    }

    /// Filter candidates, give each accepted file a preview and queue it
    ///
    /// Returns the newly queued items in the order offered.
    pub async fn intake(&self, files: Vec<CandidateFile>) -> Vec<UploadItem> {
        let mut accepted = filter_intake(files);

        for item in accepted.iter_mut() {
            match self.previews.create(item).await {
                Ok(path) => item.preview_path = Some(path),
                Err(e) => {
                    tracing::warn!(item_id = %item.id, error = %e, "Failed to create preview")
                }
            }
        }

        if accepted.is_empty() {
            return accepted;
        }

        {
            let mut queue = self.queue.lock().await;
            for item in &accepted {
                queue.push(item.clone());
            }
        }

        let item_ids: Vec<String> = accepted.iter().map(|i| i.id.clone()).collect();
        tracing::info!(count = item_ids.len(), "Files queued for upload");
        self.event_bus.emit_lossy(ImportEvent::UploadItemsQueued {
            item_ids,
            timestamp: Utc::now(),
        });

        accepted
    }

    /// Queue contents without file bytes, plus the active batch
    pub async fn snapshot(&self) -> QueueSnapshot {
        let queue = self.queue.lock().await;
        QueueSnapshot {
            items: queue.items().iter().map(UploadItem::metadata).collect(),
            active_batch: queue.active_batch(),
        }
    }

    pub async fn active_batch(&self) -> Option<Uuid> {
        self.queue.lock().await.active_batch()
    }

    /// Remove one queued item and revoke its preview
    pub async fn remove(&self, item_id: &str) -> Result<UploadItem, UploadError> {
        let removed = self.queue.lock().await.remove(item_id)?;
        self.revoke_previews(std::slice::from_ref(&removed)).await;
        Ok(removed)
    }

    /// Drop finished items; returns how many left the list
    pub async fn clear_finished(&self) -> usize {
        let removed = self.queue.lock().await.clear_finished();
        self.revoke_previews(&removed).await;
        removed.len()
    }

    /// Drop everything except an in-flight item; returns how many left the list
    pub async fn clear(&self) -> usize {
        let removed = self.queue.lock().await.clear();
        self.revoke_previews(&removed).await;
        removed.len()
    }

    async fn revoke_previews(&self, items: &[UploadItem]) {
        for path in items.iter().filter_map(|i| i.preview_path.as_deref()) {
            self.previews.revoke(path).await;
        }
    }

    /// Begin a run over everything currently queued
    ///
    /// `Ok(None)` when nothing is queued.
    pub async fn start_run(&self) -> Result<Option<RunStart>, UploadError> {
        let Some(start) = self.queue.lock().await.begin_run()? else {
            return Ok(None);
        };

        if let Err(e) = batches::insert_batch(&self.db, start.batch_id, start.total).await {
            tracing::warn!(batch_id = %start.batch_id, error = %e, "Failed to persist batch");
        }

        tracing::info!(batch_id = %start.batch_id, total = start.total, "Upload run started");
        self.event_bus.emit_lossy(ImportEvent::UploadBatchStarted {
            batch_id: start.batch_id,
            total: start.total,
            timestamp: Utc::now(),
        });

        Ok(Some(start))
    }

    /// Upload every item in the run's snapshot, one at a time, then close the batch
    ///
    /// A failed item is marked `error` and the run moves on; nothing is retried.
    pub async fn drive(&self, start: RunStart) -> Option<RunSummary> {
        let batch_id = start.batch_id;

        loop {
            let next = self.queue.lock().await.next_upload();
            let Some((item_id, upload)) = next else {
                break;
            };

            self.emit_status(batch_id, &item_id, UploadStatus::Uploading, None, None);

            let outcome = self
                .collaborator
                .upload_asset(&upload)
                .await
                .map(|receipt| receipt.pose_id)
                .map_err(|e| e.to_string());

            let completed = self.queue.lock().await.complete(&item_id, outcome);
            let item = match completed {
                Ok(item) => item,
                Err(e) => {
                    tracing::error!(batch_id = %batch_id, item_id = %item_id, error = %e, "Failed to record upload outcome");
                    continue;
                }
            };

            match item.status {
                UploadStatus::Success => tracing::info!(
                    batch_id = %batch_id,
                    file_name = %item.file_name,
                    pose_id = item.pose_id.as_deref().unwrap_or("-"),
                    "Upload succeeded"
                ),
                _ => tracing::warn!(
                    batch_id = %batch_id,
                    file_name = %item.file_name,
                    error = item.error.as_deref().unwrap_or(""),
                    "Upload failed"
                ),
            }

            self.emit_status(
                batch_id,
                &item.id,
                item.status,
                item.error.clone(),
                item.pose_id.clone(),
            );

            if let Err(e) = batches::record_item(&self.db, batch_id, &item).await {
                tracing::warn!(batch_id = %batch_id, item_id = %item.id, error = %e, "Failed to persist upload outcome");
            }
        }

        // Close the history row before the run stops being visible as active
        let summary = {
            let mut queue = self.queue.lock().await;
            let summary = queue.finish_run()?;
            if let Err(e) = batches::finish_batch(&self.db, &summary).await {
                tracing::warn!(batch_id = %batch_id, error = %e, "Failed to close batch");
            }
            summary
        };

        tracing::info!(
            batch_id = %batch_id,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Upload run completed"
        );
        self.event_bus.emit_lossy(ImportEvent::UploadBatchCompleted {
            batch_id,
            succeeded: summary.succeeded,
            failed: summary.failed,
            timestamp: Utc::now(),
        });

        Some(summary)
    }

    /// Start and drive a run to completion
    pub async fn run(&self) -> Result<Option<RunSummary>, UploadError> {
        match self.start_run().await? {
            Some(start) => Ok(self.drive(start).await),
            None => Ok(None),
        }
    }

    fn emit_status(
        &self,
        batch_id: Uuid,
        item_id: &str,
        status: UploadStatus,
        error: Option<String>,
        pose_id: Option<String>,
    ) {
        self.event_bus.emit_lossy(ImportEvent::UploadItemStatusChanged {
            batch_id,
            item_id: item_id.to_string(),
            status,
            error,
            pose_id,
            timestamp: Utc::now(),
        });
    }
}
