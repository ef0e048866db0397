//! Upload queue state machine
//!
//! Holds the session's items in array order and, while a run is active, a snapshot of
//! the item ids queued when the run began plus a single cursor into it. The
//! orchestrator advances the cursor one item at a time, so at most one item is ever
//! `uploading`. There is no retry and no abort: a failed item is marked `error` and the
//! cursor moves on.
//!
//! Pure in-memory logic; I/O lives in [`super::upload_orchestrator`].

use serde::Serialize;
use uuid::Uuid;

use super::collaborator::AssetUpload;
use crate::models::{CandidateFile, UploadError, UploadItem, UploadStatus};

/// Split candidates into queued items, dropping anything the intake filter rejects
///
/// Rejected files are not surfaced as failed items.
pub fn filter_intake(files: Vec<CandidateFile>) -> Vec<UploadItem> {
    files
        .into_iter()
        .filter(|file| {
            let accepted = file.is_acceptable();
            if !accepted {
                tracing::info!(
                    file_name = %file.file_name,
                    mime_type = %file.mime_type,
                    bytes = file.data.len(),
                    "Intake dropped file (not an image or over size limit)"
                );
            }
            accepted
        })
        .map(UploadItem::queued)
        .collect()
}

/// Batch identity and size of a freshly started run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStart {
    pub batch_id: Uuid,
    pub total: usize,
}

/// Outcome of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub batch_id: Uuid,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug)]
struct ActiveRun {
    batch_id: Uuid,
    /// Ids queued when the run began, in array order
    pending: Vec<String>,
    /// Index of the next id in `pending` to upload
    cursor: usize,
    succeeded: usize,
    failed: usize,
}

#[derive(Debug, Default)]
pub struct UploadQueue {
    items: Vec<UploadItem>,
    run: Option<ActiveRun>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&UploadItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn push(&mut self, item: UploadItem) {
        self.items.push(item);
    }

    pub fn active_batch(&self) -> Option<Uuid> {
        self.run.as_ref().map(|r| r.batch_id)
    }

    /// Remove a `queued` item; anything else is immutable in place
    pub fn remove(&mut self, id: &str) -> Result<UploadItem, UploadError> {
        let index = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| UploadError::ItemNotFound(id.to_string()))?;

        let status = self.items[index].status;
        if status != UploadStatus::Queued {
            return Err(UploadError::NotRemovable {
                id: id.to_string(),
                status,
            });
        }

        Ok(self.items.remove(index))
    }

    /// Drop `success`/`error` items from the visible list
    pub fn clear_finished(&mut self) -> Vec<UploadItem> {
        self.drain_where(|item| item.status.is_terminal())
    }

    /// Drop everything except the item currently in flight
    pub fn clear(&mut self) -> Vec<UploadItem> {
        self.drain_where(|item| item.status != UploadStatus::Uploading)
    }

    fn drain_where(&mut self, predicate: impl Fn(&UploadItem) -> bool) -> Vec<UploadItem> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.items).into_iter().partition(|i| predicate(i));
        self.items = kept;
        removed
    }

    /// Mint a batch id and snapshot the currently queued items
    ///
    /// `Ok(None)` when nothing is queued. Items queued after this call belong to the
    /// next run.
    pub fn begin_run(&mut self) -> Result<Option<RunStart>, UploadError> {
        if let Some(run) = &self.run {
            return Err(UploadError::RunInProgress(run.batch_id));
        }

        let pending: Vec<String> = self
            .items
            .iter()
            .filter(|i| i.status == UploadStatus::Queued)
            .map(|i| i.id.clone())
            .collect();
        if pending.is_empty() {
            return Ok(None);
        }

        let start = RunStart {
            batch_id: Uuid::new_v4(),
            total: pending.len(),
        };
        self.run = Some(ActiveRun {
            batch_id: start.batch_id,
            pending,
            cursor: 0,
            succeeded: 0,
            failed: 0,
        });
        Ok(Some(start))
    }

    /// Advance the cursor to the next still-queued item and mark it `uploading`
    ///
    /// Items removed since the run began are skipped. `None` once the snapshot is
    /// exhausted.
    pub fn next_upload(&mut self) -> Option<(String, AssetUpload)> {
        let run = self.run.as_mut()?;

        while run.cursor < run.pending.len() {
            let id = &run.pending[run.cursor];
            run.cursor += 1;

            let Some(item) = self.items.iter_mut().find(|i| &i.id == id) else {
                continue;
            };
            if item.begin_upload(run.batch_id).is_err() {
                continue;
            }

            let upload = AssetUpload {
                batch_id: run.batch_id,
                file_name: item.file_name.clone(),
                mime_type: item.mime_type.clone(),
                data: std::mem::take(&mut item.data),
            };
            return Some((item.id.clone(), upload));
        }

        None
    }

    /// Record the outcome of the in-flight item and return its new state
    pub fn complete(
        &mut self,
        id: &str,
        outcome: Result<Option<String>, String>,
    ) -> Result<UploadItem, UploadError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| UploadError::ItemNotFound(id.to_string()))?;

        let succeeded = outcome.is_ok();
        match outcome {
            Ok(pose_id) => item.complete_success(pose_id)?,
            Err(message) => item.complete_error(message)?,
        }

        if let Some(run) = self.run.as_mut() {
            if succeeded {
                run.succeeded += 1;
            } else {
                run.failed += 1;
            }
        }

        Ok(item.clone())
    }

    /// End the active run
    pub fn finish_run(&mut self) -> Option<RunSummary> {
        self.run.take().map(|run| RunSummary {
            batch_id: run.batch_id,
            total: run.pending.len(),
            succeeded: run.succeeded,
            failed: run.failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> CandidateFile {
        CandidateFile {
            file_name: name.to_string(),
            mime_type: "image/jpeg".to_string(),
            data: name.as_bytes().to_vec(),
        }
    }

    fn queue_with(names: &[&str]) -> UploadQueue {
        let mut queue = UploadQueue::new();
        for item in filter_intake(names.iter().map(|n| image(n)).collect()) {
            queue.push(item);
        }
        queue
    }

    #[test]
    fn test_intake_silently_drops_rejected_files() {
        let files = vec![
            image("a.jpg"),
            CandidateFile {
                file_name: "notes.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                data: vec![1],
            },
            image("b.jpg"),
        ];

        let items = filter_intake(files);

        let names: Vec<&str> = items.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
        assert!(items.iter().all(|i| i.status == UploadStatus::Queued));
    }

    #[test]
    fn test_run_visits_items_in_order_one_at_a_time() {
        let mut queue = queue_with(&["a.jpg", "b.jpg"]);
        let start = queue.begin_run().unwrap().unwrap();
        assert_eq!(start.total, 2);

        let (first, upload) = queue.next_upload().unwrap();
        assert_eq!(upload.file_name, "a.jpg");
        assert_eq!(upload.batch_id, start.batch_id);
        assert_eq!(queue.get(&first).unwrap().status, UploadStatus::Uploading);
        assert_eq!(queue.items()[1].status, UploadStatus::Queued);

        queue.complete(&first, Err("HTTP 500".to_string())).unwrap();
        let (second, upload) = queue.next_upload().unwrap();
        assert_eq!(upload.file_name, "b.jpg");
        queue.complete(&second, Ok(Some("p1".to_string()))).unwrap();

        assert!(queue.next_upload().is_none());
        let summary = queue.finish_run().unwrap();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.batch_id, start.batch_id);
    }

    #[test]
    fn test_second_run_while_active_is_rejected() {
        let mut queue = queue_with(&["a.jpg"]);
        let start = queue.begin_run().unwrap().unwrap();
        assert_eq!(
            queue.begin_run(),
            Err(UploadError::RunInProgress(start.batch_id))
        );
    }

    #[test]
    fn test_items_added_mid_run_wait_for_next_batch() {
        let mut queue = queue_with(&["a.jpg"]);
        let first = queue.begin_run().unwrap().unwrap();
        for item in filter_intake(vec![image("late.jpg")]) {
            queue.push(item);
        }

        let (id, _) = queue.next_upload().unwrap();
        queue.complete(&id, Ok(None)).unwrap();
        assert!(queue.next_upload().is_none());
        queue.finish_run();

        let second = queue.begin_run().unwrap().unwrap();
        assert_ne!(first.batch_id, second.batch_id);
        assert_eq!(second.total, 1);
        let (_, upload) = queue.next_upload().unwrap();
        assert_eq!(upload.file_name, "late.jpg");
    }

    #[test]
    fn test_empty_queue_starts_no_run() {
        let mut queue = UploadQueue::new();
        assert_eq!(queue.begin_run(), Ok(None));
        assert!(queue.active_batch().is_none());
    }

    #[test]
    fn test_only_queued_items_are_removable() {
        let mut queue = queue_with(&["a.jpg", "b.jpg"]);
        let a = queue.items()[0].id.clone();
        let b = queue.items()[1].id.clone();

        queue.begin_run().unwrap();
        let (in_flight, _) = queue.next_upload().unwrap();
        assert_eq!(in_flight, a);

        assert!(matches!(
            queue.remove(&a),
            Err(UploadError::NotRemovable { status: UploadStatus::Uploading, .. })
        ));
        assert_eq!(queue.remove(&b).unwrap().file_name, "b.jpg");
        assert!(matches!(queue.remove("nope"), Err(UploadError::ItemNotFound(_))));

        // Removed item is skipped by the cursor
        queue.complete(&a, Ok(None)).unwrap();
        assert!(queue.next_upload().is_none());
    }

    #[test]
    fn test_clear_finished_keeps_queued_items() {
        let mut queue = queue_with(&["a.jpg", "b.jpg"]);
        queue.begin_run().unwrap();
        let (a, _) = queue.next_upload().unwrap();
        queue.complete(&a, Ok(None)).unwrap();

        let removed = queue.clear_finished();

        assert_eq!(removed.len(), 1);
        assert_eq!(queue.items().len(), 1);
        assert_eq!(queue.items()[0].status, UploadStatus::Queued);
    }

    #[test]
    fn test_clear_keeps_in_flight_item() {
        let mut queue = queue_with(&["a.jpg", "b.jpg"]);
        queue.begin_run().unwrap();
        let (a, _) = queue.next_upload().unwrap();

        let removed = queue.clear();

        assert_eq!(removed.len(), 1);
        assert_eq!(queue.items().len(), 1);
        assert_eq!(queue.items()[0].id, a);
    }
}
