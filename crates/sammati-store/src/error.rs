//! Store-related error types.

use sammati_core::{ConsentKey, ConsentStatus};
use thiserror::Error;

/// Errors that can occur when mutating or reading consent state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested transition is not in the legal transition table.
    ///
    /// Reported, never silently coerced. The current status is included so
    /// the caller can re-request with correct expectations.
    #[error("invalid consent transition for {key}: {from} -> {to}")]
    InvalidTransition {
        /// The consent key.
        key: ConsentKey,
        /// Status the record actually holds.
        from: ConsentStatus,
        /// Status the transition requested.
        to: ConsentStatus,
    },

    /// No record exists for the key (and the transition cannot create one),
    /// or the optimistic `expected_from` guard did not match.
    #[error("consent record not found for {key}")]
    NotFound {
        /// The consent key.
        key: ConsentKey,
    },

    /// The optimistic concurrency guard failed: the record exists but its
    /// current status is not the one the caller expected.
    #[error("stale expectation for {key}: expected {expected}, current {current}")]
    StaleExpectation {
        /// The consent key.
        key: ConsentKey,
        /// Status the caller expected.
        expected: ConsentStatus,
        /// Status the record actually holds.
        current: ConsentStatus,
    },

    /// An internal lock was poisoned by a panicking writer.
    #[error("consent store lock poisoned")]
    LockPoisoned,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
