//! Folder lifecycle and processing orchestration tests.

mod common;

use std::time::Duration;

use anyhow::Result;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::{
    folder_service, processing_service, setup_store, setup_test_db, wait_for_terminal_status,
    FlakyStore, MockBackend, MockBehavior,
};
use docintake::database::entities::{files, folders::FolderStatus, processing_results};
use docintake::errors::CoreError;
use docintake::services::{FileUpload, FolderService, MAX_FILES_PER_FOLDER};

fn pdf_upload(name: &str) -> FileUpload {
    FileUpload {
        filename: name.to_string(),
        bytes: b"%PDF-1.4 test".to_vec(),
    }
}

#[tokio::test]
async fn test_create_folder_validation() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let service = folder_service(&db, store);

    let err = service.create_folder("   ", None).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = service.create_folder("Batch 1", Some(999)).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let folder = service.create_folder("Batch 1", None).await?;
    assert_eq!(folder.get_status(), FolderStatus::Pending);
    assert_eq!(folder.name, "Batch 1");

    Ok(())
}

#[tokio::test]
async fn test_upload_truncates_to_capacity() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let service = folder_service(&db, store);

    let folder = service.create_folder("Overfull", None).await?;
    let uploads = (0..6).map(|i| pdf_upload(&format!("doc{}.pdf", i))).collect();

    let outcome = service.add_files(folder.id, uploads).await?;
    assert_eq!(outcome.stored.len(), MAX_FILES_PER_FOLDER);
    assert_eq!(outcome.rejected, 1);
    assert_eq!(service.count_files(folder.id).await?, MAX_FILES_PER_FOLDER);

    // A full folder rejects outright.
    let err = service
        .add_files(folder.id, vec![pdf_upload("extra.pdf")])
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::CapacityExceeded { .. }));
    assert_eq!(service.count_files(folder.id).await?, MAX_FILES_PER_FOLDER);

    Ok(())
}

#[tokio::test]
async fn test_upload_capacity_holds_across_batches() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let service = folder_service(&db, store);

    let folder = service.create_folder("Batches", None).await?;

    let first = service
        .add_files(folder.id, (0..3).map(|i| pdf_upload(&format!("a{}.pdf", i))).collect())
        .await?;
    assert_eq!(first.stored.len(), 3);
    assert_eq!(first.rejected, 0);

    let second = service
        .add_files(folder.id, (0..3).map(|i| pdf_upload(&format!("b{}.pdf", i))).collect())
        .await?;
    assert_eq!(second.stored.len(), 2);
    assert_eq!(second.rejected, 1);

    assert_eq!(service.count_files(folder.id).await?, MAX_FILES_PER_FOLDER);
    Ok(())
}

#[tokio::test]
async fn test_failed_put_discards_staged_objects() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let temp_dir = tempfile::TempDir::new()?;
    // Two puts succeed, the third fails mid-batch.
    let store = FlakyStore::new(temp_dir.path(), 2);
    let service = FolderService::new(db.clone(), store);

    let folder = service.create_folder("Flaky store", None).await?;
    let uploads = (0..3).map(|i| pdf_upload(&format!("doc{}.pdf", i))).collect();

    let err = service.add_files(folder.id, uploads).await.unwrap_err();
    assert!(matches!(err, CoreError::Storage(_)));

    // No rows, and the already-staged objects were dropped again.
    assert_eq!(service.count_files(folder.id).await?, 0);
    assert_eq!(std::fs::read_dir(temp_dir.path())?.count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_uploads_never_exceed_capacity() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, temp_dir) = setup_store()?;
    let service = folder_service(&db, store);

    let folder = service.create_folder("Contended", None).await?;

    let mut handles = Vec::new();
    for batch in 0..4 {
        let service = service.clone();
        let folder_id = folder.id;
        handles.push(tokio::spawn(async move {
            let uploads = (0..3)
                .map(|i| pdf_upload(&format!("b{}f{}.pdf", batch, i)))
                .collect();
            service.add_files(folder_id, uploads).await
        }));
    }

    // A caller may also lose the write lock outright; its batch then fails
    // as a whole and must leave nothing behind.
    let mut stored_total = 0;
    for handle in handles {
        match handle.await? {
            Ok(outcome) => stored_total += outcome.stored.len(),
            Err(CoreError::CapacityExceeded { .. }) | Err(CoreError::Database(_)) => {}
            Err(other) => panic!("unexpected upload error: {}", other),
        }
    }

    let count = service.count_files(folder.id).await?;
    assert!(stored_total >= 1);
    assert_eq!(stored_total, count);
    assert!(count <= MAX_FILES_PER_FOLDER);
    // Every staged object either has a row or was dropped again.
    assert_eq!(std::fs::read_dir(temp_dir.path())?.count(), count);

    Ok(())
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension_before_storing() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let service = folder_service(&db, store);

    let folder = service.create_folder("Strict", None).await?;
    let uploads = vec![pdf_upload("fine.pdf"), pdf_upload("nope.exe")];

    let err = service.add_files(folder.id, uploads).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    // The whole batch is rejected; nothing was committed.
    assert_eq!(service.count_files(folder.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_upload_download_round_trip() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let service = folder_service(&db, store);

    let folder = service.create_folder("Round trip", None).await?;
    let outcome = service
        .add_files(
            folder.id,
            vec![FileUpload {
                filename: "scan.Tiff".to_string(),
                bytes: vec![0x49, 0x49, 0x2a, 0x00],
            }],
        )
        .await?;

    let stored = &outcome.stored[0];
    assert_eq!(stored.file_type, "tiff");
    assert_eq!(stored.file_size, 4);

    let (file, bytes) = service.download_file(stored.id).await?;
    assert_eq!(file.original_filename, "scan.Tiff");
    assert_eq!(bytes, vec![0x49, 0x49, 0x2a, 0x00]);

    Ok(())
}

#[tokio::test]
async fn test_delete_folder_cascades_files_and_objects() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let service = folder_service(&db, store.clone());

    let folder = service.create_folder("Doomed", None).await?;
    let outcome = service
        .add_files(folder.id, vec![pdf_upload("one.pdf"), pdf_upload("two.pdf")])
        .await?;
    let keys: Vec<String> = outcome
        .stored
        .iter()
        .map(|f| f.storage_key.clone())
        .collect();

    service.delete_folder(folder.id).await?;

    assert!(matches!(
        service.get_folder(folder.id).await.unwrap_err(),
        CoreError::NotFound(_)
    ));
    let remaining = files::Entity::find()
        .filter(files::Column::FolderId.eq(folder.id))
        .count(&db)
        .await?;
    assert_eq!(remaining, 0);

    use docintake::storage::ObjectStore;
    for key in keys {
        assert!(matches!(
            store.get(&key).await.unwrap_err(),
            CoreError::NotFound(_)
        ));
    }

    let err = service.delete_folder(folder.id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_illegal_transitions_rejected() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let service = folder_service(&db, store);

    let folder = service.create_folder("States", None).await?;

    // pending cannot jump straight to a terminal state
    let err = service
        .transition(folder.id, FolderStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidState { .. }));

    service.transition(folder.id, FolderStatus::Processing).await?;
    service.transition(folder.id, FolderStatus::Completed).await?;

    // completed cannot go back to pending-equivalent edges
    let err = service
        .transition(folder.id, FolderStatus::Failed)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidState { .. }));

    // but a re-run may claim it again
    service.transition(folder.id, FolderStatus::Processing).await?;

    Ok(())
}

#[tokio::test]
async fn test_processing_happy_path_and_exclusivity() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let folders = folder_service(&db, store);
    let backend = MockBackend::new(MockBehavior::Succeed, Duration::from_millis(150));
    let processing = processing_service(&db, folders.clone(), backend.clone(), Duration::from_secs(5));

    let folder = folders.create_folder("Batch 1", None).await?;
    folders
        .add_files(
            folder.id,
            (0..3).map(|i| pdf_upload(&format!("f{}.pdf", i))).collect(),
        )
        .await?;

    let handle = processing.start_processing(folder.id).await?;
    assert_eq!(handle.folder_id, folder.id);
    assert!(folders.get_folder(folder.id).await?.is_processing());

    // Immediate second start must lose, and must not dispatch again.
    let err = processing.start_processing(folder.id).await.unwrap_err();
    assert!(matches!(err, CoreError::PreconditionFailed(_)));

    let status = wait_for_terminal_status(&folders, folder.id, Duration::from_secs(5)).await?;
    assert_eq!(status, "completed");
    assert_eq!(backend.call_count(), 1);

    let result_rows = processing_results::Entity::find()
        .filter(processing_results::Column::FolderId.eq(folder.id))
        .count(&db)
        .await?;
    assert_eq!(result_rows, 1);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_starts_admit_one_run() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let folders = folder_service(&db, store);
    // Slow enough that no run finishes while the starts are still racing.
    let backend = MockBackend::new(MockBehavior::Succeed, Duration::from_secs(1));
    let processing =
        processing_service(&db, folders.clone(), backend.clone(), Duration::from_secs(10));

    let folder = folders.create_folder("Contended run", None).await?;
    folders.add_files(folder.id, vec![pdf_upload("f.pdf")]).await?;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let processing = processing.clone();
        let folder_id = folder.id;
        handles.push(tokio::spawn(async move {
            processing.start_processing(folder_id).await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => wins += 1,
            Err(CoreError::PreconditionFailed(_)) => {}
            Err(other) => panic!("unexpected start error: {}", other),
        }
    }
    assert_eq!(wins, 1);

    let status = wait_for_terminal_status(&folders, folder.id, Duration::from_secs(10)).await?;
    assert_eq!(status, "completed");
    assert_eq!(backend.call_count(), 1);

    let result_rows = processing_results::Entity::find()
        .filter(processing_results::Column::FolderId.eq(folder.id))
        .count(&db)
        .await?;
    assert_eq!(result_rows, 1);

    Ok(())
}

#[tokio::test]
async fn test_processing_preconditions_are_distinct() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let folders = folder_service(&db, store);
    let backend = MockBackend::new(MockBehavior::Succeed, Duration::from_millis(10));
    let processing = processing_service(&db, folders.clone(), backend, Duration::from_secs(5));

    let err = processing.start_processing(12345).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let folder = folders.create_folder("Empty", None).await?;
    let err = processing.start_processing(folder.id).await.unwrap_err();
    match err {
        CoreError::PreconditionFailed(message) => assert!(message.contains("no files")),
        other => panic!("expected PreconditionFailed, got {:?}", other.to_string()),
    }

    Ok(())
}

#[tokio::test]
async fn test_failed_run_records_failed_status_without_result() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let folders = folder_service(&db, store);
    let backend = MockBackend::new(MockBehavior::Fail, Duration::from_millis(10));
    let processing = processing_service(&db, folders.clone(), backend, Duration::from_secs(5));

    let folder = folders.create_folder("Unlucky", None).await?;
    folders.add_files(folder.id, vec![pdf_upload("f.pdf")]).await?;

    processing.start_processing(folder.id).await?;
    let status = wait_for_terminal_status(&folders, folder.id, Duration::from_secs(5)).await?;
    assert_eq!(status, "failed");

    let result_rows = processing_results::Entity::find()
        .filter(processing_results::Column::FolderId.eq(folder.id))
        .count(&db)
        .await?;
    assert_eq!(result_rows, 0);

    Ok(())
}

#[tokio::test]
async fn test_timeout_fails_run_and_preserves_prior_result() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let folders = folder_service(&db, store);

    let folder = folders.create_folder("Flaky", None).await?;
    folders.add_files(folder.id, vec![pdf_upload("f.pdf")]).await?;

    // First run completes and stores a result.
    let good_backend = MockBackend::new(MockBehavior::Succeed, Duration::from_millis(10));
    let good = processing_service(&db, folders.clone(), good_backend, Duration::from_secs(5));
    good.start_processing(folder.id).await?;
    let status = wait_for_terminal_status(&folders, folder.id, Duration::from_secs(5)).await?;
    assert_eq!(status, "completed");

    let first_result = processing_results::Entity::find()
        .filter(processing_results::Column::FolderId.eq(folder.id))
        .one(&db)
        .await?
        .expect("first run stored a result");

    // Second run hangs past the deadline; the orchestrator fails it.
    let hang_backend = MockBackend::new(MockBehavior::Hang, Duration::from_millis(0));
    let hanging =
        processing_service(&db, folders.clone(), hang_backend, Duration::from_millis(200));
    hanging.start_processing(folder.id).await?;
    let status = wait_for_terminal_status(&folders, folder.id, Duration::from_secs(5)).await?;
    assert_eq!(status, "failed");

    // The last-known-good result is untouched.
    let surviving = processing_results::Entity::find()
        .filter(processing_results::Column::FolderId.eq(folder.id))
        .one(&db)
        .await?
        .expect("prior result still present");
    assert_eq!(surviving.run_id, first_result.run_id);
    assert_eq!(surviving.payload, first_result.payload);

    Ok(())
}

#[tokio::test]
async fn test_rerun_of_completed_folder_replaces_result() -> Result<()> {
    let (db, _temp_db) = setup_test_db().await?;
    let (store, _temp_dir) = setup_store()?;
    let folders = folder_service(&db, store);
    let backend = MockBackend::new(MockBehavior::Succeed, Duration::from_millis(10));
    let processing = processing_service(&db, folders.clone(), backend, Duration::from_secs(5));

    let folder = folders.create_folder("Again", None).await?;
    folders.add_files(folder.id, vec![pdf_upload("f.pdf")]).await?;

    processing.start_processing(folder.id).await?;
    wait_for_terminal_status(&folders, folder.id, Duration::from_secs(5)).await?;
    let first = processing_results::Entity::find()
        .filter(processing_results::Column::FolderId.eq(folder.id))
        .one(&db)
        .await?
        .expect("result stored");

    processing.start_processing(folder.id).await?;
    let status = wait_for_terminal_status(&folders, folder.id, Duration::from_secs(5)).await?;
    assert_eq!(status, "completed");

    let rows = processing_results::Entity::find()
        .filter(processing_results::Column::FolderId.eq(folder.id))
        .all(&db)
        .await?;
    assert_eq!(rows.len(), 1);
    assert_ne!(rows[0].run_id, first.run_id);

    Ok(())
}
