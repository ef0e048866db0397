//! Event types for the Asana event system
//!
//! Provides shared event definitions and the EventBus used to fan import progress out to
//! SSE subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Per-item upload lifecycle
///
/// `Queued → Uploading → {Success, Error}`. Terminal states never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Accepted by intake, waiting for the orchestrator
    Queued,
    /// Request in flight
    Uploading,
    /// Collaborator accepted the file
    Success,
    /// Collaborator rejected the file or the request failed
    Error,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadStatus::Queued => "queued",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Success => "success",
            UploadStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UploadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(UploadStatus::Queued),
            "uploading" => Ok(UploadStatus::Uploading),
            "success" => Ok(UploadStatus::Success),
            "error" => Ok(UploadStatus::Error),
            other => Err(format!("unknown upload status: {}", other)),
        }
    }
}

/// Import event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ImportEvent {
    /// A CSV file was parsed and validated for preview
    CsvPreviewed {
        total_rows: usize,
        valid_rows: usize,
        invalid_rows: usize,
        timestamp: DateTime<Utc>,
    },

    /// Valid rows were handed to the persistence collaborator
    CsvCommitted {
        commit_id: Uuid,
        rows_submitted: usize,
        created: usize,
        updated: usize,
        failed: usize,
        timestamp: DateTime<Utc>,
    },

    /// Files passed the intake filter and were queued
    UploadItemsQueued {
        item_ids: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// An "upload all" run began
    UploadBatchStarted {
        batch_id: Uuid,
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// One item moved through the upload state machine
    UploadItemStatusChanged {
        batch_id: Uuid,
        item_id: String,
        status: UploadStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pose_id: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Every item in the run reached a terminal state
    UploadBatchCompleted {
        batch_id: Uuid,
        succeeded: usize,
        failed: usize,
        timestamp: DateTime<Utc>,
    },
}

impl ImportEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            ImportEvent::CsvPreviewed { .. } => "CsvPreviewed",
            ImportEvent::CsvCommitted { .. } => "CsvCommitted",
            ImportEvent::UploadItemsQueued { .. } => "UploadItemsQueued",
            ImportEvent::UploadBatchStarted { .. } => "UploadBatchStarted",
            ImportEvent::UploadItemStatusChanged { .. } => "UploadItemStatusChanged",
            ImportEvent::UploadBatchCompleted { .. } => "UploadBatchCompleted",
        }
    }
}

/// Broadcast bus for import events
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ImportEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ImportEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ImportEvent,
    ) -> Result<usize, broadcast::error::SendError<ImportEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ImportEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
