//! Sammati Runtime - Wiring for the consent validation core.
//!
//! This crate assembles the leaf components into a running service:
//! - [`ConsentService`], the handle external layers talk to (no ambient
//!   globals — callers receive handles)
//! - The bounded audit queue between validation decisions and the ledger
//!   writer, with backpressure surfaced as [`RuntimeError::AuditBacklog`]
//! - The single ledger-writer task that guarantees eventual,
//!   order-preserving delivery of decision facts
//! - The periodic expiry sweeper, which applies `Expired` through the same
//!   store path as any user-driven transition, so it is audited identically
//!
//! Consent mutations are audited synchronously (fail-closed); only
//! validation decision facts ride the queue, so validation never blocks on
//! the ledger.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod event;
mod queue;
mod service;
mod sweep;

pub use error::{RuntimeError, RuntimeResult};
pub use event::{ConsentAction, ConsentEvent};
pub use queue::DEFAULT_AUDIT_QUEUE_CAPACITY;
pub use service::{ConsentService, ValidationResponse};
pub use sweep::spawn_expiry_sweeper;
