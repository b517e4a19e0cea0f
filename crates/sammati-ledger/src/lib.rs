//! Sammati Ledger - Hash-chained audit logging.
//!
//! This crate provides:
//! - Chain-linked audit entries (each contains the BLAKE3 digest of the
//!   previous entry's content)
//! - A strict single-writer [`AuditLedger`] that assigns block indexes and
//!   chain links under one lock, and fails closed if the durable write does
//!   not complete
//! - Genesis-to-tip chain verification that trusts no cached state
//! - Pluggable storage: in-memory for tests, line-oriented JSONL with fsync
//!   for a durable, offline-verifiable export
//!
//! # Security Model
//!
//! Every entry's `hash` covers its index, timestamp, actor, action,
//! resource, canonicalized details, and the previous entry's hash. Any
//! retroactive edit — a flipped byte, a removed entry, a reordered pair —
//! breaks the chain at a detectable index. The genesis link and digest
//! algorithm ([`GENESIS_PREVIOUS_HASH`], [`DIGEST_ALGORITHM`]) are fixed
//! constants so third parties can re-verify without trusting this process.
//!
//! # Example
//!
//! ```
//! use sammati_ledger::{AuditAction, AuditLedger};
//! use sammati_core::ActorId;
//! use serde_json::json;
//!
//! let ledger = AuditLedger::in_memory();
//!
//! let entry = ledger.append(
//!     ActorId::new("u1"),
//!     AuditAction::ConsentGranted,
//!     "consent:u1/f1/marketing",
//!     json!({"version": 1}),
//! ).unwrap();
//! assert_eq!(entry.block_index, 0);
//!
//! let report = ledger.verify().unwrap();
//! assert!(report.ok);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod entry;
mod error;
mod ledger;
mod storage;
mod verify;

pub use entry::{AuditAction, AuditEntry, ENTRY_HASH_DOMAIN, GENESIS_PREVIOUS_HASH};
pub use error::{LedgerError, LedgerResult};
pub use ledger::{AuditLedger, AuditQuery};
pub use storage::{JsonlLedgerStorage, LedgerStorage, MemoryLedgerStorage};
pub use verify::{ChainIssue, ChainVerificationReport, verify_chain, verify_subrange};

// Re-export the digest algorithm identifier for offline verifiers.
pub use sammati_core::DIGEST_ALGORITHM;
