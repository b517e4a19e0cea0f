//! Transition requests and the lifecycle facts they produce.

use sammati_core::{ConsentId, ConsentKey, ConsentStatus, ContentDigest, Timestamp, canonical_json};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A requested consent state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentTransition {
    /// The consent key to mutate.
    pub key: ConsentKey,
    /// Optimistic concurrency guard: if set, the transition only applies
    /// when the record currently holds exactly this status.
    pub expected_from: Option<ConsentStatus>,
    /// Target status.
    pub to: ConsentStatus,
    /// When the transition takes effect.
    pub effective_at: Timestamp,
    /// New validity bound for grants/renewals; `None` leaves the grant
    /// unbounded (or, for non-grant transitions, keeps the existing bound).
    pub expires_at: Option<Timestamp>,
}

impl ConsentTransition {
    /// Digest of the transition payload, stored on the record as its
    /// `evidence_hash`.
    #[must_use]
    pub fn evidence_digest(&self) -> ContentDigest {
        let payload = json!({
            "key": {
                "user_id": self.key.user_id.0,
                "fiduciary_id": self.key.fiduciary_id.0,
                "purpose_id": self.key.purpose_id.0,
            },
            "to": self.to.as_str(),
            "effective_at": self.effective_at.to_rfc3339_micros(),
            "expires_at": self.expires_at.map(|t| t.to_rfc3339_micros()),
        });
        ContentDigest::hash_with_domain(
            "sammati-consent-transition-v1",
            canonical_json(&payload).as_bytes(),
        )
    }
}

/// A successfully applied transition, as seen by the audit trail.
///
/// The store emits one fact per successful `apply`; the caller must forward
/// it to the audit ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleFact {
    /// Surrogate ID of the affected record.
    pub consent_id: ConsentId,
    /// The consent key.
    pub key: ConsentKey,
    /// Status before the transition; `None` when the record was born.
    pub from: Option<ConsentStatus>,
    /// Status after the transition.
    pub to: ConsentStatus,
    /// Record version after the transition.
    pub version: u64,
    /// When the transition took effect.
    pub effective_at: Timestamp,
    /// Evidence digest of the applied transition.
    pub evidence_hash: ContentDigest,
}
