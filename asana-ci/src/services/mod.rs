//! Services for asana-ci

pub mod collaborator;
pub mod preview_store;
pub mod upload_orchestrator;
pub mod upload_queue;

pub use collaborator::{
    AssetUpload, CollaboratorError, HttpCollaborator, PoseCollaborator, UploadReceipt,
};
pub use preview_store::PreviewStore;
pub use upload_orchestrator::{QueueSnapshot, UploadOrchestrator};
pub use upload_queue::{filter_intake, RunStart, RunSummary, UploadQueue};
