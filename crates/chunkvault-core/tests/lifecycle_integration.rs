use std::path::Path;
use std::sync::Arc;

use chunkvault_core::config::VaultConfig;
use chunkvault_core::engine::DedupEngine;
use chunkvault_types::error::VaultError;
use chunkvault_types::BackupId;

fn engine_at(root: &Path, chunk_size: usize) -> DedupEngine {
    let mut config = VaultConfig::default();
    config.chunker.chunk_size = chunk_size;
    DedupEngine::open_local(root, config).unwrap()
}

/// Locate the on-disk payload file for a chunk hash under the store root.
fn chunk_path(root: &Path, hex: &str) -> std::path::PathBuf {
    root.join("chunks").join(&hex[..2]).join(hex)
}

#[test]
fn full_backup_lifecycle() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_at(tmp.path(), 8);

    let content_a: Vec<u8> = (0..=255u8).cycle().take(4000).collect();
    let content_b = content_a.clone(); // identical content, second snapshot

    let backup_a = engine.create_backup(&content_a, "/data/a.bin").unwrap();
    let backup_b = engine.create_backup(&content_b, "/data/b.bin").unwrap();

    // Second backup of identical content stored nothing new.
    assert_eq!(backup_b.metadata.deduplicated_size, 0);
    let stats = engine.calculate_stats().unwrap();
    assert_eq!(stats.total_backups, 2);
    assert_eq!(stats.total_original_size, 8000);

    // Both restore byte-exact.
    let out_a = tmp.path().join("restore/a.bin");
    engine.restore_backup(&backup_a.id, &out_a).unwrap();
    assert_eq!(std::fs::read(&out_a).unwrap(), content_a);
    assert_eq!(
        engine.restore_backup_bytes(&backup_b.id).unwrap(),
        content_b
    );

    // Deleting one backup keeps all shared chunks.
    let delete_stats = engine.delete_backup(&backup_a.id).unwrap();
    assert_eq!(delete_stats.chunks_deleted, 0);
    assert_eq!(
        engine.restore_backup_bytes(&backup_b.id).unwrap(),
        content_b
    );

    // Deleting the second reclaims everything.
    engine.delete_backup(&backup_b.id).unwrap();
    let stats = engine.calculate_stats().unwrap();
    assert_eq!(stats.total_backups, 0);
    assert_eq!(stats.unique_chunks, 0);

    // Nothing left to clean, nothing corrupt.
    let cleanup = engine.cleanup_orphans().unwrap();
    assert_eq!(cleanup.cleaned_chunks, 0);
    let report = engine.verify_integrity().unwrap();
    assert_eq!(report.verified_chunks, 0);
    assert!(report.corrupted.is_empty());
}

#[test]
fn index_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let content = b"persist me across engine instances".to_vec();

    let id = {
        let engine = engine_at(tmp.path(), 8);
        engine.create_backup(&content, "/data/p.bin").unwrap().id
    };

    // A fresh engine over the same directory sees the backup and restores it.
    let engine = engine_at(tmp.path(), 8);
    let listed = engine.list_backups().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);

    let info = engine.get_backup_info(&id).unwrap();
    assert_eq!(info.original_path, "/data/p.bin");
    assert_eq!(engine.restore_backup_bytes(&id).unwrap(), content);
}

#[test]
fn missing_index_means_empty_store() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_at(tmp.path(), 8);
    assert!(engine.list_backups().unwrap().is_empty());
    let stats = engine.calculate_stats().unwrap();
    assert_eq!(stats.total_backups, 0);
    assert_eq!(stats.unique_chunks, 0);
}

#[test]
fn unparseable_index_surfaces_index_corrupt() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let engine = engine_at(tmp.path(), 8);
        engine.create_backup(b"something", "/x").unwrap();
    }
    std::fs::write(tmp.path().join("index"), b"definitely not msgpack").unwrap();

    let engine = engine_at(tmp.path(), 8);
    let err = engine.list_backups().unwrap_err();
    assert!(matches!(err, VaultError::IndexCorrupt(_)));
}

#[test]
fn on_disk_corruption_is_detected_and_fails_restore() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_at(tmp.path(), 4);
    let created = engine.create_backup(b"AAAABBBBCCCC", "/c.bin").unwrap();

    // Scribble over one chunk payload on disk.
    let victim = created.chunks[1].hash;
    let path = chunk_path(tmp.path(), &victim.to_hex());
    assert!(path.exists());
    std::fs::write(&path, b"\xff\xde\xad\xbe\xef").unwrap();

    let report = engine.verify_integrity().unwrap();
    assert_eq!(report.corrupted, vec![victim]);
    assert_eq!(report.verified_chunks, 2);

    let dest = tmp.path().join("out.bin");
    let err = engine.restore_backup(&created.id, &dest).unwrap_err();
    assert!(matches!(err, VaultError::IntegrityCheckFailed { .. }));
    assert!(!dest.exists());
}

#[test]
fn orphan_cleanup_reclaims_exactly_the_unreferenced_chunk() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_at(tmp.path(), 4);

    let shared = engine.create_backup(b"AAAABBBB", "/shared").unwrap();
    let extra = engine.create_backup(b"AAAAZZZZ", "/extra").unwrap();

    // Deleting `extra` reclaims ZZZZ immediately; AAAA is still shared.
    let stats = engine.delete_backup(&extra.id).unwrap();
    assert_eq!(stats.chunks_deleted, 1);
    assert_eq!(stats.space_freed, 4);

    // The shared backup is intact and a cleanup pass finds nothing further.
    assert_eq!(engine.restore_backup_bytes(&shared.id).unwrap(), b"AAAABBBB");
    let cleanup = engine.cleanup_orphans().unwrap();
    assert_eq!(cleanup.cleaned_chunks, 0);

    let report = engine.verify_integrity().unwrap();
    assert!(report.corrupted.is_empty());
    assert_eq!(report.verified_chunks, 2);
}

#[test]
fn backup_file_reads_source_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_at(tmp.path().join("store").as_path(), 8);

    let source = tmp.path().join("source.dat");
    let content = vec![0x3Cu8; 500];
    std::fs::write(&source, &content).unwrap();

    let created = engine.backup_file(&source).unwrap();
    assert_eq!(created.original_path, source.display().to_string());
    assert_eq!(engine.restore_backup_bytes(&created.id).unwrap(), content);
}

#[test]
fn unreadable_source_fails_source_read() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_at(tmp.path(), 8);
    let err = engine
        .backup_file(Path::new("/no/such/file.anywhere"))
        .unwrap_err();
    assert!(matches!(err, VaultError::SourceRead { .. }));
}

#[test]
fn unknown_backup_id_surfaces_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_at(tmp.path(), 8);
    let missing = BackupId::generate();
    assert!(matches!(
        engine.get_backup_info(&missing).unwrap_err(),
        VaultError::BackupNotFound(_)
    ));
    assert!(matches!(
        engine.delete_backup(&missing).unwrap_err(),
        VaultError::BackupNotFound(_)
    ));
}

#[test]
fn list_backups_is_newest_first() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_at(tmp.path(), 8);
    let first = engine.create_backup(b"one", "/1").unwrap();
    let second = engine.create_backup(b"two", "/2").unwrap();

    let listed = engine.list_backups().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].metadata.timestamp >= listed[1].metadata.timestamp);
    let ids: Vec<_> = listed.iter().map(|b| b.id).collect();
    assert!(ids.contains(&first.id));
    assert!(ids.contains(&second.id));
}

#[test]
fn concurrent_backups_are_serialized() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = Arc::new(engine_at(tmp.path(), 8));

    let handles: Vec<_> = (0..8u8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let content = vec![i; 100];
                engine
                    .create_backup(&content, &format!("/worker/{i}"))
                    .unwrap()
                    .id
            })
        })
        .collect();

    let ids: Vec<BackupId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Every backup landed in the index and restores to its own content.
    let engine = engine_at(tmp.path(), 8);
    assert_eq!(engine.list_backups().unwrap().len(), 8);
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(
            engine.restore_backup_bytes(id).unwrap(),
            vec![i as u8; 100]
        );
    }
}
