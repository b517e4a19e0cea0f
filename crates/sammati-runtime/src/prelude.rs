//! Convenience re-exports for consumers of the runtime.

pub use crate::error::{RuntimeError, RuntimeResult};
pub use crate::event::{ConsentAction, ConsentEvent};
pub use crate::service::{ConsentService, ValidationResponse};
pub use crate::sweep::spawn_expiry_sweeper;

pub use sammati_core::prelude::*;
pub use sammati_engine::{ValidationReason, ValidationRequest};
pub use sammati_ledger::{AuditAction, AuditLedger, AuditQuery};
pub use sammati_store::ConsentStore;
