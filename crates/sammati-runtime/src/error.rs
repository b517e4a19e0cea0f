//! Runtime-level error types.

use sammati_core::ConsentStatus;
use thiserror::Error;

/// Errors surfaced by the consent service.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A consent store operation failed.
    #[error(transparent)]
    Store(#[from] sammati_store::StoreError),

    /// A ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] sammati_ledger::LedgerError),

    /// The audit queue is full. The decision was evaluated but NOT returned:
    /// no consent decision may be handed out without a guaranteed downstream
    /// audit trail. The caller should retry after backoff.
    #[error("audit queue backlog: decision cannot be recorded right now")]
    AuditBacklog,

    /// The ledger writer task has shut down; the service is unusable.
    #[error("audit queue closed: ledger writer is gone")]
    AuditChannelClosed,

    /// A transition landed on a status with no audit action mapping. The
    /// transition table admits no such target, so seeing this means the
    /// store and the audit mapping have diverged.
    #[error("consent status {0} has no audit action")]
    UnauditableStatus(ConsentStatus),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
