//! Ledger storage trait and backends.
//!
//! The ledger only needs an append-only medium. Two backends are provided:
//! an in-memory vector for tests, and a line-oriented JSONL file whose
//! append path fsyncs before reporting success — the same stream doubles as
//! the offline-verifiable export format.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::entry::AuditEntry;
use crate::error::{LedgerError, LedgerResult};

/// Storage backend for audit entries.
///
/// Implementations must be thread-safe, append-only (no update or delete),
/// and must not report success until the entry is durable.
pub trait LedgerStorage: Send + Sync {
    /// Durably persist one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted; the caller treats
    /// that as an atomic append failure.
    fn append(&self, entry: &AuditEntry) -> LedgerResult<()>;

    /// Load every stored entry in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval or deserialization fails.
    fn load_all(&self) -> LedgerResult<Vec<AuditEntry>>;

    /// Number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn len(&self) -> LedgerResult<usize>;

    /// Whether no entries are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// In-memory storage (for testing).
#[derive(Debug, Default)]
pub struct MemoryLedgerStorage {
    entries: RwLock<Vec<AuditEntry>>,
    /// When set, the next `append` fails once (for failure-path tests).
    #[cfg(test)]
    fail_next: std::sync::atomic::AtomicBool,
}

impl MemoryLedgerStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arrange for the next append to fail (test hook).
    #[cfg(test)]
    pub(crate) fn fail_next_append(&self) {
        self.fail_next
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

impl LedgerStorage for MemoryLedgerStorage {
    fn append(&self, entry: &AuditEntry) -> LedgerResult<()> {
        #[cfg(test)]
        if self.fail_next.swap(false, std::sync::atomic::Ordering::SeqCst) {
            return Err(LedgerError::Storage("injected append failure".to_string()));
        }

        let mut entries = self.entries.write().map_err(|_| LedgerError::LockPoisoned)?;
        entries.push(entry.clone());
        Ok(())
    }

    fn load_all(&self) -> LedgerResult<Vec<AuditEntry>> {
        let entries = self.entries.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(entries.clone())
    }

    fn len(&self) -> LedgerResult<usize> {
        let entries = self.entries.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(entries.len())
    }
}

/// Append-only JSONL file storage.
///
/// One canonicalized entry per line. The file is opened in append mode and
/// every write is flushed and fsynced before success is reported, so a
/// reported append survives process death. The same file is the integrity
/// export: third parties can read it line by line and re-verify the chain
/// offline.
pub struct JsonlLedgerStorage {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlLedgerStorage {
    /// Open (or create) a JSONL ledger file.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LedgerError::Storage(format!("open {}: {e}", path.display())))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStorage for JsonlLedgerStorage {
    fn append(&self, entry: &AuditEntry) -> LedgerResult<()> {
        let line = entry
            .to_export_line()
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let mut file = self.file.lock().map_err(|_| LedgerError::LockPoisoned)?;
        writeln!(file, "{line}").map_err(|e| LedgerError::Storage(e.to_string()))?;
        file.flush()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        // Durable or failed: success is only reported after fsync.
        file.sync_all()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(())
    }

    fn load_all(&self) -> LedgerResult<Vec<AuditEntry>> {
        let file = File::open(&self.path)
            .map_err(|e| LedgerError::Storage(format!("open {}: {e}", self.path.display())))?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| LedgerError::Storage(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEntry = serde_json::from_str(&line)
                .map_err(|e| LedgerError::Serialization(e.to_string()))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn len(&self) -> LedgerResult<usize> {
        Ok(self.load_all()?.len())
    }
}

impl std::fmt::Debug for JsonlLedgerStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlLedgerStorage")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{AuditAction, GENESIS_PREVIOUS_HASH};
    use crate::verify::verify_chain;
    use sammati_core::{ActorId, Timestamp};
    use serde_json::json;

    fn entry(index: u64, previous: sammati_core::ContentDigest) -> AuditEntry {
        AuditEntry::create(
            index,
            Timestamp::now(),
            ActorId::new("u1"),
            AuditAction::ConsentGranted,
            format!("consent:{index}"),
            json!({"version": index}),
            previous,
        )
    }

    #[test]
    fn test_memory_append_order() {
        let storage = MemoryLedgerStorage::new();
        let e0 = entry(0, GENESIS_PREVIOUS_HASH);
        let e1 = entry(1, e0.hash);

        storage.append(&e0).unwrap();
        storage.append(&e1).unwrap();

        let loaded = storage.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].block_index, 0);
        assert_eq!(loaded[1].block_index, 1);
    }

    #[test]
    fn test_jsonl_roundtrip_and_verify() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonlLedgerStorage::open(dir.path().join("audit.jsonl")).unwrap();

        let e0 = entry(0, GENESIS_PREVIOUS_HASH);
        let e1 = entry(1, e0.hash);
        let e2 = entry(2, e1.hash);
        for e in [&e0, &e1, &e2] {
            storage.append(e).unwrap();
        }

        let loaded = storage.load_all().unwrap();
        assert_eq!(loaded.len(), 3);
        assert!(verify_chain(&loaded).ok);
    }

    #[test]
    fn test_jsonl_reopen_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let e0 = entry(0, GENESIS_PREVIOUS_HASH);
        {
            let storage = JsonlLedgerStorage::open(&path).unwrap();
            storage.append(&e0).unwrap();
        }

        let storage = JsonlLedgerStorage::open(&path).unwrap();
        assert_eq!(storage.len().unwrap(), 1);

        let e1 = entry(1, e0.hash);
        storage.append(&e1).unwrap();
        assert!(verify_chain(&storage.load_all().unwrap()).ok);
    }

    #[test]
    fn test_jsonl_flipped_byte_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let storage = JsonlLedgerStorage::open(&path).unwrap();
        let e0 = entry(0, GENESIS_PREVIOUS_HASH);
        let e1 = entry(1, e0.hash);
        storage.append(&e0).unwrap();
        storage.append(&e1).unwrap();
        drop(storage);

        // Flip one byte inside the second line's details.
        let contents = std::fs::read_to_string(&path).unwrap();
        let tampered = contents.replacen("\"version\":1", "\"version\":7", 1);
        assert_ne!(contents, tampered);
        std::fs::write(&path, tampered).unwrap();

        let storage = JsonlLedgerStorage::open(&path).unwrap();
        let report = verify_chain(&storage.load_all().unwrap());
        assert!(!report.ok);
        assert_eq!(report.first_bad_index, Some(1));
    }
}
