//! Sammati Engine - Stateless consent validation.
//!
//! This crate answers one question: "is purpose P authorized for user U
//! under fiduciary F, right now" — and justifies the answer with a closed
//! reason code.
//!
//! [`validate`] is a pure function of a [`ValidationRequest`] and a
//! [`ConsentSnapshot`]: no mutation, no I/O, no randomness. Denial is a
//! normal, fully-typed result, never an error. Recording the decision in
//! the audit ledger is the caller's responsibility, which keeps decision
//! logic and the write path independently testable.
//!
//! [`ConsentSnapshot`]: sammati_store::ConsentSnapshot

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod decision;
mod request;

pub use decision::{ValidationReason, ValidationResult, validate};
pub use request::ValidationRequest;
