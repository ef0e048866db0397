//! asana-ci library interface
//!
//! Content import service for the pose library: CSV preview/commit and bulk asset
//! uploads, exposed over HTTP for the admin console.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use asana_common::events::EventBus;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::services::{PoseCollaborator, PreviewStore, UploadOrchestrator};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Local batch and commit history
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Persistence collaborator used by the CSV commit
    pub collaborator: Arc<dyn PoseCollaborator>,
    /// Upload session and run driver
    pub orchestrator: UploadOrchestrator,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        collaborator: Arc<dyn PoseCollaborator>,
        previews: PreviewStore,
    ) -> Self {
        let orchestrator = UploadOrchestrator::new(
            collaborator.clone(),
            previews,
            event_bus.clone(),
            db.clone(),
        );
        Self {
            db,
            event_bus,
            collaborator,
            orchestrator,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember an error for `/health`
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Request body ceiling; intake carries base64 images of up to 5 MiB each
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::extract::DefaultBodyLimit;
    use axum::routing::get;

    Router::new()
        .merge(api::import_routes())
        .merge(api::upload_routes())
        .route("/uploads/events", get(api::upload_event_stream))
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
