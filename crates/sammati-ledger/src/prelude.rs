//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sammati_ledger::prelude::*;` to import all essential types.

// Errors
pub use crate::{LedgerError, LedgerResult};

// Entries
pub use crate::{AuditAction, AuditEntry, GENESIS_PREVIOUS_HASH};

// Ledger and queries
pub use crate::{AuditLedger, AuditQuery};

// Verification
pub use crate::{ChainIssue, ChainVerificationReport, verify_chain, verify_subrange};

// Storage
pub use crate::{JsonlLedgerStorage, LedgerStorage, MemoryLedgerStorage};
