//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sammati_core::prelude::*;` to import all essential types.

// Identity & time
pub use crate::{
    ActorId, ConsentId, ConsentKey, FiduciaryId, PurposeId, RequestId, Timestamp, UserId,
    ValidationId,
};

// Consent state
pub use crate::{ConsentRecord, ConsentStatus};

// Hashing & canonicalization
pub use crate::{ContentDigest, canonical_json};
