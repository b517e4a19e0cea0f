//! The authoritative consent record.

use serde::{Deserialize, Serialize};

use crate::digest::ContentDigest;
use crate::status::ConsentStatus;
use crate::types::{ConsentId, ConsentKey, Timestamp};

/// Current consent state for one `(user, fiduciary, purpose)` key.
///
/// Records are superseded in place, never deleted: each transition bumps
/// `version` and replaces `evidence_hash`, so the audit ledger can refer to
/// the exact version that was in force at decision time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// Surrogate identifier, stable across versions; used for audit linkage.
    pub id: ConsentId,
    /// The identity key.
    pub key: ConsentKey,
    /// Current lifecycle status.
    pub status: ConsentStatus,
    /// When consent was (last) granted; `None` until the first grant.
    pub granted_at: Option<Timestamp>,
    /// When the grant lapses, if bounded.
    pub expires_at: Option<Timestamp>,
    /// Monotonically increasing version, starting at 1.
    pub version: u64,
    /// Digest of the transition payload that produced this version.
    pub evidence_hash: ContentDigest,
}

impl ConsentRecord {
    /// Whether the record authorizes processing at instant `at`.
    ///
    /// Expiry here is a read-time determination; it does not transition the
    /// record (the sweeper does that through the store).
    #[must_use]
    pub fn is_active_at(&self, at: Timestamp) -> bool {
        if !self.status.is_active() {
            return false;
        }
        match self.expires_at {
            Some(expiry) => at <= expiry,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FiduciaryId, PurposeId, UserId};
    use chrono::{Duration, Utc};

    fn record(status: ConsentStatus, expires_at: Option<Timestamp>) -> ConsentRecord {
        ConsentRecord {
            id: ConsentId::new(),
            key: ConsentKey::new(
                UserId::new("u1"),
                FiduciaryId::new("f1"),
                PurposeId::new("marketing"),
            ),
            status,
            granted_at: Some(Timestamp::now()),
            expires_at,
            version: 1,
            evidence_hash: ContentDigest::hash(b"evidence"),
        }
    }

    #[test]
    fn test_granted_without_expiry_is_active() {
        let rec = record(ConsentStatus::Granted, None);
        assert!(rec.is_active_at(Timestamp::now()));
    }

    #[test]
    fn test_granted_within_window_is_active() {
        let expiry = Timestamp::from_datetime(Utc::now() + Duration::days(10));
        let rec = record(ConsentStatus::Granted, Some(expiry));

        let one_day = Timestamp::from_datetime(Utc::now() + Duration::days(1));
        assert!(rec.is_active_at(one_day));

        let eleven_days = Timestamp::from_datetime(Utc::now() + Duration::days(11));
        assert!(!rec.is_active_at(eleven_days));
    }

    #[test]
    fn test_withdrawn_is_never_active() {
        let rec = record(ConsentStatus::Withdrawn, None);
        assert!(!rec.is_active_at(Timestamp::now()));
    }
}
