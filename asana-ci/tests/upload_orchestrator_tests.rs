//! Upload orchestrator integration tests
//!
//! Drives real runs against a mock collaborator, an in-memory history database and
//! a temporary preview folder.

mod helpers;

use std::sync::Arc;

use asana_ci::db::batches;
use asana_ci::models::{CandidateFile, UploadError, UploadStatus};
use asana_common::events::ImportEvent;
use helpers::{image, test_app_state, MockCollaborator};
use tokio::sync::Semaphore;

/// Second of three files fails; the others still succeed under one batch id
#[tokio::test]
async fn tc_upl_001_failure_is_isolated_within_batch() {
    // Given: three queued files, the second engineered to fail
    let collaborator = Arc::new(MockCollaborator::new().failing_on("two.jpg"));
    let (state, _dir) = test_app_state(collaborator.clone()).await;
    let orchestrator = state.orchestrator.clone();
    orchestrator
        .intake(vec![image("one.jpg"), image("two.jpg"), image("three.jpg")])
        .await;

    // When: the run completes
    let summary = orchestrator.run().await.unwrap().unwrap();

    // Then: 1 and 3 succeed, 2 errors, all share the batch id
    let items = orchestrator.snapshot().await.items;
    let statuses: Vec<UploadStatus> = items.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![UploadStatus::Success, UploadStatus::Error, UploadStatus::Success]
    );
    assert!(items.iter().all(|i| i.batch_id == Some(summary.batch_id)));
    assert_eq!(items[0].pose_id.as_deref(), Some("pose-one.jpg"));
    assert!(items[1].error.as_deref().unwrap().contains("cannot store two.jpg"));
    assert_eq!((summary.succeeded, summary.failed), (2, 1));

    // And: uploads went out in array order, each tagged with the batch
    assert_eq!(
        collaborator.uploaded_files(),
        vec!["one.jpg", "two.jpg", "three.jpg"]
    );
    assert!(collaborator
        .uploads
        .lock()
        .unwrap()
        .iter()
        .all(|u| u.batch_id == summary.batch_id));
}

#[tokio::test]
async fn tc_upl_002_each_run_mints_a_new_batch() {
    let (state, _dir) = test_app_state(Arc::new(MockCollaborator::new())).await;
    let orchestrator = state.orchestrator.clone();

    orchestrator.intake(vec![image("a.jpg")]).await;
    let first = orchestrator.run().await.unwrap().unwrap();
    orchestrator.intake(vec![image("b.jpg")]).await;
    let second = orchestrator.run().await.unwrap().unwrap();

    assert_ne!(first.batch_id, second.batch_id);
    // Only the newly queued item was part of the second run
    assert_eq!(second.total, 1);

    // Nothing queued: no run at all
    assert_eq!(orchestrator.run().await.unwrap(), None);
}

#[tokio::test]
async fn tc_upl_003_intake_drops_rejected_files() {
    let (state, _dir) = test_app_state(Arc::new(MockCollaborator::new())).await;

    let queued = state
        .orchestrator
        .intake(vec![
            image("ok.jpg"),
            CandidateFile {
                file_name: "big.png".to_string(),
                mime_type: "image/png".to_string(),
                data: vec![0u8; asana_ci::models::MAX_UPLOAD_BYTES + 1],
            },
            CandidateFile {
                file_name: "poses.csv".to_string(),
                mime_type: "text/csv".to_string(),
                data: b"name\n".to_vec(),
            },
        ])
        .await;

    assert_eq!(queued.len(), 1);
    assert_eq!(state.orchestrator.snapshot().await.items.len(), 1);
}

#[tokio::test]
async fn tc_upl_008_snapshot_omits_file_contents() {
    // Given: one full-size queued image
    let (state, _dir) = test_app_state(Arc::new(MockCollaborator::new())).await;
    state
        .orchestrator
        .intake(vec![CandidateFile {
            file_name: "large.png".to_string(),
            mime_type: "image/png".to_string(),
            data: vec![7u8; asana_ci::models::MAX_UPLOAD_BYTES],
        }])
        .await;

    // When: the session is viewed
    let snapshot = state.orchestrator.snapshot().await;

    // Then: metadata is present but the bytes stay in the queue
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].size_bytes, asana_ci::models::MAX_UPLOAD_BYTES);
    assert!(snapshot.items[0].data.is_empty());
    assert_eq!(state.orchestrator.active_batch().await, None);

    // And: the bytes still reach the collaborator
    let summary = state.orchestrator.run().await.unwrap().unwrap();
    assert_eq!(summary.succeeded, 1);
}

#[tokio::test]
async fn tc_upl_004_events_follow_item_lifecycle() {
    let collaborator = Arc::new(MockCollaborator::new().failing_on("b.jpg"));
    let (state, _dir) = test_app_state(collaborator).await;
    let mut rx = state.event_bus.subscribe();

    state.orchestrator.intake(vec![image("a.jpg"), image("b.jpg")]).await;
    let summary = state.orchestrator.run().await.unwrap().unwrap();

    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ImportEvent::UploadItemStatusChanged { batch_id, status, .. } = &event {
            assert_eq!(*batch_id, summary.batch_id);
            names.push(format!("{}:{}", event.event_type(), status));
        } else {
            names.push(event.event_type().to_string());
        }
    }

    assert_eq!(
        names,
        vec![
            "UploadItemsQueued",
            "UploadBatchStarted",
            "UploadItemStatusChanged:uploading",
            "UploadItemStatusChanged:success",
            "UploadItemStatusChanged:uploading",
            "UploadItemStatusChanged:error",
            "UploadBatchCompleted",
        ]
    );
}

#[tokio::test]
async fn tc_upl_005_batch_history_is_persisted() {
    let collaborator = Arc::new(MockCollaborator::new().failing_on("b.jpg"));
    let (state, _dir) = test_app_state(collaborator).await;

    state.orchestrator.intake(vec![image("a.jpg"), image("b.jpg")]).await;
    let summary = state.orchestrator.run().await.unwrap().unwrap();

    let history = batches::list_batches(&state.db).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].batch_id, summary.batch_id);
    assert_eq!((history[0].total, history[0].succeeded, history[0].failed), (2, 1, 1));
    assert!(history[0].ended_at.is_some());

    let items = batches::load_batch_items(&state.db, summary.batch_id).await.unwrap();
    assert_eq!(items.len(), 2);
    let failed = items.iter().find(|i| i.file_name == "b.jpg").unwrap();
    assert_eq!(failed.status, UploadStatus::Error);
    assert!(failed.error.is_some());
}

#[tokio::test]
async fn tc_upl_006_previews_are_revoked_on_remove_and_clear() {
    let (state, _dir) = test_app_state(Arc::new(MockCollaborator::new())).await;
    let orchestrator = state.orchestrator.clone();

    let queued = orchestrator
        .intake(vec![image("a.jpg"), image("b.jpg"), image("c.jpg")])
        .await;
    let previews: Vec<_> = queued
        .iter()
        .map(|i| i.preview_path.clone().unwrap())
        .collect();
    assert!(previews.iter().all(|p| p.exists()));

    // Remove one queued item
    orchestrator.remove(&queued[0].id).await.unwrap();
    assert!(!previews[0].exists());
    assert!(previews[1].exists());

    // Finish the rest, then clear finished
    orchestrator.run().await.unwrap();
    assert_eq!(orchestrator.clear_finished().await, 2);
    assert!(!previews[1].exists());
    assert!(!previews[2].exists());
    assert!(orchestrator.snapshot().await.items.is_empty());
}

#[tokio::test]
async fn tc_upl_007_in_flight_item_is_immutable_and_run_is_exclusive() {
    // Given: uploads that wait for a permit
    let gate = Arc::new(Semaphore::new(0));
    let collaborator = Arc::new(MockCollaborator::new().gated(gate.clone()));
    let (state, _dir) = test_app_state(collaborator).await;
    let orchestrator = state.orchestrator.clone();
    let queued = orchestrator.intake(vec![image("a.jpg"), image("b.jpg")]).await;

    let start = orchestrator.start_run().await.unwrap().unwrap();
    let driver = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.drive(start).await })
    };

    // Wait until the first item is in flight
    for _ in 0..100 {
        if orchestrator.snapshot().await.items[0].status == UploadStatus::Uploading {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    // Then: the in-flight item cannot be removed and a second run is refused
    assert!(matches!(
        orchestrator.remove(&queued[0].id).await,
        Err(UploadError::NotRemovable { status: UploadStatus::Uploading, .. })
    ));
    assert_eq!(
        orchestrator.start_run().await,
        Err(UploadError::RunInProgress(start.batch_id))
    );

    // And: a queued item removed mid-run is skipped
    orchestrator.remove(&queued[1].id).await.unwrap();

    gate.add_permits(2);
    let summary = driver.await.unwrap().unwrap();
    assert_eq!((summary.total, summary.succeeded, summary.failed), (2, 1, 0));
    assert_eq!(orchestrator.snapshot().await.active_batch, None);
}
