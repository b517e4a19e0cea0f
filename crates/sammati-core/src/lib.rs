//! Sammati Core - Foundation types for the consent management core.
//!
//! This crate provides:
//! - Identity newtypes for users, fiduciaries, purposes and consent records
//! - The `(user, fiduciary, purpose)` consent key
//! - The closed [`ConsentStatus`] state machine shared by the store, the
//!   validation engine and the audit ledger
//! - [`ConsentRecord`], the authoritative per-key consent state
//! - [`ContentDigest`], the BLAKE3-256 digest used for evidence hashes and
//!   audit chain linking
//! - Deterministic JSON canonicalization for hashed payloads
//!
//! Status transitions are enforced centrally here so that no call site can
//! invent its own lifecycle.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod canon;
mod digest;
mod record;
mod status;
mod types;

pub use canon::canonical_json;
pub use digest::{ContentDigest, DIGEST_ALGORITHM};
pub use record::ConsentRecord;
pub use status::ConsentStatus;
pub use types::{
    ActorId, ConsentId, ConsentKey, FiduciaryId, PurposeId, RequestId, Timestamp, UserId,
    ValidationId,
};
