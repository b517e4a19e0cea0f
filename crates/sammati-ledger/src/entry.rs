//! Audit entry types and actions.
//!
//! Entries are created exactly once, by [`crate::AuditLedger::append`], and
//! are immutable from then on. No update or delete operation exists
//! anywhere in this crate.

use sammati_core::{ActorId, ContentDigest, Timestamp, canonical_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Domain-separation key for entry digests.
pub const ENTRY_HASH_DOMAIN: &str = "sammati-audit-entry-v1";

/// The fixed `previous_hash` of the genesis entry: the all-zero digest.
pub const GENESIS_PREVIOUS_HASH: ContentDigest = ContentDigest::zero();

/// What an audit entry records.
///
/// Closed set with stable snake_case names; the names participate in the
/// entry hash, so they must never be renamed once a ledger exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A consent was granted (first grant or re-grant after renewal).
    ConsentGranted,
    /// A consent was denied.
    ConsentDenied,
    /// A granted consent was withdrawn.
    ConsentWithdrawn,
    /// A granted consent was renewed.
    ConsentRenewed,
    /// A consent's validity window elapsed (applied by the sweeper).
    ConsentExpired,
    /// The validation engine produced a decision.
    ValidationDecided,
}

impl AuditAction {
    /// Stable lowercase name, matching the serde encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConsentGranted => "consent_granted",
            Self::ConsentDenied => "consent_denied",
            Self::ConsentWithdrawn => "consent_withdrawn",
            Self::ConsentRenewed => "consent_renewed",
            Self::ConsentExpired => "consent_expired",
            Self::ValidationDecided => "validation_decided",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the chain; strictly increasing by 1 from 0 (genesis).
    pub block_index: u64,
    /// When the entry was appended.
    pub timestamp: Timestamp,
    /// Who caused the recorded action.
    pub actor_id: ActorId,
    /// What happened.
    pub action: AuditAction,
    /// The resource the action concerns (consent ID, request ID, ...).
    pub resource_id: String,
    /// Action-specific payload; canonicalized before hashing.
    pub details: Value,
    /// Digest of the previous entry; all-zero for genesis.
    pub previous_hash: ContentDigest,
    /// Digest over this entry's content and `previous_hash`.
    pub hash: ContentDigest,
}

impl AuditEntry {
    /// Assemble and hash a prospective entry.
    ///
    /// Only the ledger calls this; it is `pub(crate)` so no other component
    /// can mint entries.
    pub(crate) fn create(
        block_index: u64,
        timestamp: Timestamp,
        actor_id: ActorId,
        action: AuditAction,
        resource_id: String,
        details: Value,
        previous_hash: ContentDigest,
    ) -> Self {
        let mut entry = Self {
            block_index,
            timestamp,
            actor_id,
            action,
            resource_id,
            details,
            previous_hash,
            hash: ContentDigest::zero(),
        };
        entry.hash = entry.compute_hash();
        entry
    }

    /// The exact bytes covered by this entry's hash.
    #[must_use]
    pub fn hashed_payload(&self) -> Vec<u8> {
        // Length-prefix free: fields are separated by 0x1F (unit separator),
        // which cannot appear in the numeric, RFC 3339, identifier or JSON
        // renderings used here without being escaped.
        const SEP: &[u8] = &[0x1F];

        let mut data = Vec::new();
        data.extend_from_slice(&self.block_index.to_be_bytes());
        data.extend_from_slice(SEP);
        data.extend_from_slice(self.timestamp.to_rfc3339_micros().as_bytes());
        data.extend_from_slice(SEP);
        data.extend_from_slice(self.actor_id.as_str().as_bytes());
        data.extend_from_slice(SEP);
        data.extend_from_slice(self.action.as_str().as_bytes());
        data.extend_from_slice(SEP);
        data.extend_from_slice(self.resource_id.as_bytes());
        data.extend_from_slice(SEP);
        data.extend_from_slice(canonical_json(&self.details).as_bytes());
        data.extend_from_slice(SEP);
        data.extend_from_slice(self.previous_hash.as_bytes());
        data
    }

    /// Recompute the digest from this entry's fields.
    #[must_use]
    pub fn compute_hash(&self) -> ContentDigest {
        ContentDigest::hash_with_domain(ENTRY_HASH_DOMAIN, &self.hashed_payload())
    }

    /// Whether the stored hash matches the recomputed one.
    #[must_use]
    pub fn hash_is_consistent(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Whether this entry chain-links to `previous`.
    #[must_use]
    pub fn follows(&self, previous: &AuditEntry) -> bool {
        self.previous_hash == previous.hash
            && self.block_index == previous.block_index.saturating_add(1)
    }

    /// Render the entry as one canonical JSON line for the export stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be serialized (cannot happen for
    /// entries this crate constructs).
    pub fn to_export_line(&self) -> Result<String, serde_json::Error> {
        let value = serde_json::to_value(self)?;
        Ok(canonical_json(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(index: u64, previous_hash: ContentDigest) -> AuditEntry {
        AuditEntry::create(
            index,
            Timestamp::now(),
            ActorId::new("u1"),
            AuditAction::ConsentGranted,
            "consent:u1/f1/marketing".to_string(),
            json!({"version": 1}),
            previous_hash,
        )
    }

    #[test]
    fn test_hash_is_consistent_on_creation() {
        let e = entry(0, GENESIS_PREVIOUS_HASH);
        assert!(e.hash_is_consistent());
        assert!(!e.hash.is_zero());
    }

    #[test]
    fn test_chain_linking() {
        let e0 = entry(0, GENESIS_PREVIOUS_HASH);
        let e1 = entry(1, e0.hash);

        assert!(e1.follows(&e0));
        assert!(!e0.follows(&e1));
    }

    #[test]
    fn test_tampered_details_break_hash() {
        let mut e = entry(0, GENESIS_PREVIOUS_HASH);
        assert!(e.hash_is_consistent());

        e.details = json!({"version": 2});
        assert!(!e.hash_is_consistent());
    }

    #[test]
    fn test_hash_covers_key_ordering_insensitively() {
        let a = AuditEntry::create(
            0,
            Timestamp::now(),
            ActorId::new("u1"),
            AuditAction::ValidationDecided,
            "request:r1".to_string(),
            json!({"a": 1, "b": 2}),
            GENESIS_PREVIOUS_HASH,
        );
        let mut b = a.clone();
        // Same logical details, different construction order.
        let mut map = serde_json::Map::new();
        map.insert("b".to_string(), json!(2));
        map.insert("a".to_string(), json!(1));
        b.details = Value::Object(map);

        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_export_line_roundtrip() {
        let e = entry(0, GENESIS_PREVIOUS_HASH);
        let line = e.to_export_line().unwrap();

        let decoded: AuditEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded.hash, e.hash);
        assert!(decoded.hash_is_consistent());
    }
}
