//! Sammati Store - Authoritative consent state.
//!
//! This crate provides:
//! - [`ConsentStore`], the single source of truth for current consent state
//!   per `(user, fiduciary, purpose)` key
//! - Transition enforcement against the central [`ConsentStatus`] table,
//!   with an optimistic-concurrency guard
//! - Immutable [`ConsentSnapshot`]s for lock-free validation reads
//! - [`LifecycleFact`]s describing each applied transition, which the caller
//!   forwards to the audit ledger
//!
//! The store itself never writes to the ledger; keeping the ledger's
//! single-writer discipline at the ledger boundary is the caller's job.
//!
//! [`ConsentStatus`]: sammati_core::ConsentStatus

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod snapshot;
mod store;
mod transition;

pub use error::{StoreError, StoreResult};
pub use snapshot::ConsentSnapshot;
pub use store::ConsentStore;
pub use transition::{ConsentTransition, LifecycleFact};
