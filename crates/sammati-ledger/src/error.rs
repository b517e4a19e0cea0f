//! Ledger-related error types.

use thiserror::Error;

use crate::verify::ChainIssue;

/// Errors that can occur with audit logging.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Durable persistence of an entry failed after its index and hash were
    /// computed. The append failed atomically: no partial entry is visible
    /// and the chain head did not advance. Retry policy belongs to the
    /// caller; the ledger never retries internally.
    #[error("ledger write failed at block {block_index}: {source}")]
    WriteFailed {
        /// The block index the failed entry would have taken.
        block_index: u64,
        /// The underlying storage failure.
        #[source]
        source: Box<LedgerError>,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The chain failed verification. Fatal at the system level: processes
    /// that depend on ledger trust must halt, and an operator must be paged.
    /// Never self-healed.
    #[error("audit chain broken at block {first_bad_index}: {issue}")]
    ChainBroken {
        /// First index where the chain fails.
        first_bad_index: u64,
        /// What exactly is wrong at that index.
        issue: ChainIssue,
    },

    /// The writer lock was poisoned by a panicking appender.
    #[error("ledger writer lock poisoned")]
    LockPoisoned,
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
