//! The single-writer audit ledger.

use sammati_core::{ActorId, ContentDigest, Timestamp};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::entry::{AuditAction, AuditEntry, GENESIS_PREVIOUS_HASH};
use crate::error::{LedgerError, LedgerResult};
use crate::storage::{JsonlLedgerStorage, LedgerStorage, MemoryLedgerStorage};
use crate::verify::{ChainVerificationReport, verify_chain};

/// Chain head state, guarded by the writer lock.
#[derive(Debug, Clone, Copy)]
struct Head {
    next_index: u64,
    last_hash: ContentDigest,
}

/// Append-only, hash-chained audit ledger.
///
/// All appends across the whole system are serialized through the one
/// internal writer lock, because `block_index` and `previous_hash`
/// assignment must be a total order. This is the one place where throughput
/// is deliberately traded for correctness; reads never take the writer
/// lock.
///
/// If durable persistence fails after the index and hash are computed, the
/// append fails atomically: the head does not advance and
/// [`LedgerError::WriteFailed`] is returned. The ledger never retries
/// internally — a blind retry could duplicate index assignment under races,
/// so retry policy belongs to the caller.
pub struct AuditLedger {
    storage: Arc<dyn LedgerStorage>,
    head: Mutex<Head>,
}

impl AuditLedger {
    /// Create a ledger over in-memory storage (for testing).
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            storage: Arc::new(MemoryLedgerStorage::new()),
            head: Mutex::new(Head {
                next_index: 0,
                last_hash: GENESIS_PREVIOUS_HASH,
            }),
        }
    }

    /// Create a ledger over an existing storage backend, recovering the
    /// chain head from the stored tip.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored entries cannot be loaded.
    pub fn with_storage(storage: Arc<dyn LedgerStorage>) -> LedgerResult<Self> {
        let entries = storage.load_all()?;
        let head = entries.last().map_or(
            Head {
                next_index: 0,
                last_hash: GENESIS_PREVIOUS_HASH,
            },
            |tip| Head {
                next_index: tip.block_index.saturating_add(1),
                last_hash: tip.hash,
            },
        );
        Ok(Self {
            storage,
            head: Mutex::new(head),
        })
    }

    /// Open a ledger backed by a JSONL file, recovering the head.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed.
    pub fn open_jsonl(path: impl AsRef<std::path::Path>) -> LedgerResult<Self> {
        let storage = JsonlLedgerStorage::open(path)?;
        Self::with_storage(Arc::new(storage))
    }

    /// Append an entry to the chain.
    ///
    /// Acquires the writer lock, assigns the next block index and chain
    /// link, persists durably, then advances the head. The entry is
    /// returned to the caller; no other component can construct one.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::WriteFailed`] if persistence fails; the head
    /// is not advanced and no partial entry is visible.
    pub fn append(
        &self,
        actor_id: ActorId,
        action: AuditAction,
        resource_id: impl Into<String>,
        details: Value,
    ) -> LedgerResult<AuditEntry> {
        let mut head = self.head.lock().map_err(|_| LedgerError::LockPoisoned)?;

        let entry = AuditEntry::create(
            head.next_index,
            Timestamp::now(),
            actor_id,
            action,
            resource_id.into(),
            details,
            head.last_hash,
        );

        if let Err(source) = self.storage.append(&entry) {
            return Err(LedgerError::WriteFailed {
                block_index: entry.block_index,
                source: Box::new(source),
            });
        }

        head.next_index = entry.block_index.saturating_add(1);
        head.last_hash = entry.hash;

        debug!(
            block_index = entry.block_index,
            action = %entry.action,
            resource = %entry.resource_id,
            "Appended audit entry"
        );

        Ok(entry)
    }

    /// All entries in ascending `block_index` order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn entries(&self) -> LedgerResult<Vec<AuditEntry>> {
        self.storage.load_all()
    }

    /// Entries matching a filter, in ascending `block_index` order.
    ///
    /// Read-only; takes no writer lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn query(&self, filter: &AuditQuery) -> LedgerResult<Vec<AuditEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect())
    }

    /// Number of entries appended so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer lock is poisoned.
    pub fn len(&self) -> LedgerResult<u64> {
        let head = self.head.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(head.next_index)
    }

    /// Whether the ledger holds no entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer lock is poisoned.
    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Recompute the full chain from genesis and report on its integrity.
    ///
    /// Trusts nothing in memory: entries are reloaded from storage and
    /// every hash is recomputed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails; a *broken chain* is
    /// reported in the returned report, not as an error.
    pub fn verify(&self) -> LedgerResult<ChainVerificationReport> {
        Ok(verify_chain(&self.entries()?))
    }

    /// Like [`AuditLedger::verify`], but a broken chain becomes
    /// [`LedgerError::ChainBroken`] — for callers whose continued operation
    /// depends on ledger trust.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ChainBroken`] if verification fails, or a
    /// storage error if entries cannot be loaded.
    pub fn require_intact(&self) -> LedgerResult<ChainVerificationReport> {
        let report = self.verify()?;
        if report.ok {
            return Ok(report);
        }
        match (report.first_bad_index, report.issue) {
            (Some(first_bad_index), Some(issue)) => Err(LedgerError::ChainBroken {
                first_bad_index,
                issue,
            }),
            // Unreachable for reports produced by verify_chain.
            _ => Err(LedgerError::Storage(
                "verification failed without an index".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for AuditLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let next = self.head.lock().map(|h| h.next_index).unwrap_or(0);
        f.debug_struct("AuditLedger")
            .field("next_index", &next)
            .finish_non_exhaustive()
    }
}

/// Filter for [`AuditLedger::query`].
///
/// Unset fields match everything; set fields are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Match entries by actor.
    pub actor_id: Option<ActorId>,
    /// Match entries by action kind.
    pub action: Option<AuditAction>,
    /// Match entries by resource.
    pub resource_id: Option<String>,
    /// Match entries whose timestamp lies in `[start, end]`.
    pub time_range: Option<(Timestamp, Timestamp)>,
}

impl AuditQuery {
    /// Match everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one actor.
    #[must_use]
    pub fn actor(mut self, actor_id: ActorId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Restrict to one action kind.
    #[must_use]
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Restrict to one resource.
    #[must_use]
    pub fn resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Restrict to an inclusive time range.
    #[must_use]
    pub fn between(mut self, start: Timestamp, end: Timestamp) -> Self {
        self.time_range = Some((start, end));
        self
    }

    fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(actor) = &self.actor_id
            && entry.actor_id != *actor
        {
            return false;
        }
        if let Some(action) = self.action
            && entry.action != action
        {
            return false;
        }
        if let Some(resource) = &self.resource_id
            && entry.resource_id != *resource
        {
            return false;
        }
        if let Some((start, end)) = self.time_range
            && (entry.timestamp < start || entry.timestamp > end)
        {
            return false;
        }
        true
    }
}
