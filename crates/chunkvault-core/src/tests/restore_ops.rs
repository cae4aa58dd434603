use std::sync::Arc;

use chunkvault_types::error::VaultError;
use chunkvault_types::BackupId;

use crate::commands::{backup, restore};
use crate::compress::{self, Compression};
use crate::storage::StorageBackend;
use crate::testutil::{test_vault_with_chunk_size, vault_over, MemoryBackend};

#[test]
fn roundtrip_is_byte_exact() {
    let mut vault = test_vault_with_chunk_size(4);
    let content: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    let created = backup::run(&mut vault, &content, "cycle.bin").unwrap();

    let restored = restore::reassemble(&mut vault, &created.id).unwrap();
    assert_eq!(restored, content);
}

#[test]
fn empty_backup_restores_to_empty_bytes() {
    let mut vault = test_vault_with_chunk_size(4);
    let created = backup::run(&mut vault, b"", "empty").unwrap();
    let restored = restore::reassemble(&mut vault, &created.id).unwrap();
    assert!(restored.is_empty());
}

#[test]
fn restore_writes_destination_file() {
    let mut vault = test_vault_with_chunk_size(8);
    let content = b"write me to disk, in order";
    let created = backup::run(&mut vault, content, "file.txt").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("restored/file.txt");
    let stats = restore::run(&mut vault, &created.id, &dest).unwrap();

    assert_eq!(stats.bytes_written, content.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), content);
}

#[test]
fn unknown_backup_fails_not_found() {
    let mut vault = test_vault_with_chunk_size(4);
    let missing = BackupId::generate();
    let err = restore::reassemble(&mut vault, &missing).unwrap_err();
    assert!(matches!(err, VaultError::BackupNotFound(id) if id == missing));
}

#[test]
fn missing_chunk_payload_fails_integrity_check() {
    let backend = Arc::new(MemoryBackend::new());
    let mut vault = vault_over(backend.clone(), 4);
    let created = backup::run(&mut vault, b"AAAABBBB", "victim").unwrap();

    // Drop one payload behind the engine's back.
    let key = created.chunks[0].hash.storage_key();
    backend.delete(&key).unwrap();

    let err = restore::reassemble(&mut vault, &created.id).unwrap_err();
    assert!(matches!(err, VaultError::IntegrityCheckFailed { .. }));
}

#[test]
fn tampered_chunk_fails_integrity_check_and_skips_destination() {
    let backend = Arc::new(MemoryBackend::new());
    let mut vault = vault_over(backend.clone(), 4);
    let created = backup::run(&mut vault, b"AAAABBBB", "victim").unwrap();

    // Replace one payload with validly encoded but different content, so the
    // failure is caught by the whole-file checksum rather than the decoder.
    let key = created.chunks[0].hash.storage_key();
    let forged = compress::compress(Compression::Lz4, b"ZZZZ").unwrap();
    backend.put(&key, &forged).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("should-not-exist");
    let err = restore::run(&mut vault, &created.id, &dest).unwrap_err();

    assert!(matches!(err, VaultError::IntegrityCheckFailed { .. }));
    assert!(!dest.exists());
}

#[test]
fn restore_never_changes_refcounts() {
    let mut vault = test_vault_with_chunk_size(4);
    let created = backup::run(&mut vault, b"AAAABBBBAAAACCCC", "rc").unwrap();

    let before: Vec<u32> = created
        .chunks
        .iter()
        .map(|c| vault.index().chunk(&c.hash).unwrap().ref_count)
        .collect();

    restore::reassemble(&mut vault, &created.id).unwrap();

    let after: Vec<u32> = created
        .chunks
        .iter()
        .map(|c| vault.index().chunk(&c.hash).unwrap().ref_count)
        .collect();
    assert_eq!(before, after);
}

#[test]
fn restore_touches_last_accessed() {
    let mut vault = test_vault_with_chunk_size(4);
    let created = backup::run(&mut vault, b"AAAABBBB", "touch").unwrap();
    let hash = created.chunks[0].hash;
    let before = vault.index().chunk(&hash).unwrap().last_accessed;

    restore::reassemble(&mut vault, &created.id).unwrap();

    let after = vault.index().chunk(&hash).unwrap().last_accessed;
    assert!(after >= before);
}
