//! The authoritative consent store.

use sammati_core::{ConsentId, ConsentKey, ConsentRecord, ConsentStatus, Timestamp};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::snapshot::ConsentSnapshot;
use crate::transition::{ConsentTransition, LifecycleFact};

/// Authoritative map of current consent state per `(user, fiduciary,
/// purpose)` key.
///
/// Reads are concurrent; mutations are serialized behind the write lock, so
/// two simultaneous transitions for the same key can never race each other
/// into a lost update. Callers receive a handle (`Arc<ConsentStore>`), never
/// an ambient global.
#[derive(Debug, Default)]
pub struct ConsentStore {
    records: RwLock<HashMap<ConsentKey, ConsentRecord>>,
}

impl ConsentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Apply a consent state transition.
    ///
    /// A record is born when `Granted` or `Denied` is requested for an
    /// absent key (the implicit `Pending` initial state permits exactly
    /// those two targets). Every other transition requires an existing
    /// record whose current status permits the move.
    ///
    /// On success the updated record is returned together with a
    /// [`LifecycleFact`] that the caller must forward to the audit ledger.
    /// The store itself never writes audit entries.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidTransition`] if the transition table forbids
    ///   the move; the current status is reported back.
    /// - [`StoreError::NotFound`] if no record exists and the transition is
    ///   not a birth transition.
    /// - [`StoreError::StaleExpectation`] if `expected_from` is set and does
    ///   not match the current status.
    pub fn apply(
        &self,
        transition: &ConsentTransition,
    ) -> StoreResult<(ConsentRecord, LifecycleFact)> {
        use std::collections::hash_map::Entry;

        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;

        let (record, from) = match records.entry(transition.key.clone()) {
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if let Some(expected) = transition.expected_from
                    && expected != existing.status
                {
                    return Err(StoreError::StaleExpectation {
                        key: transition.key.clone(),
                        expected,
                        current: existing.status,
                    });
                }

                if !existing.status.can_transition_to(transition.to) {
                    return Err(StoreError::InvalidTransition {
                        key: transition.key.clone(),
                        from: existing.status,
                        to: transition.to,
                    });
                }

                let from = existing.status;
                existing.status = transition.to;
                existing.version = existing.version.saturating_add(1);
                existing.evidence_hash = transition.evidence_digest();
                if transition.to.is_active() {
                    existing.granted_at = Some(transition.effective_at);
                    existing.expires_at = transition.expires_at;
                }
                (existing.clone(), Some(from))
            },
            Entry::Vacant(slot) => {
                if let Some(expected) = transition.expected_from
                    && expected != ConsentStatus::Pending
                {
                    return Err(StoreError::NotFound {
                        key: transition.key.clone(),
                    });
                }

                if !ConsentStatus::Pending.can_transition_to(transition.to) {
                    return Err(StoreError::NotFound {
                        key: transition.key.clone(),
                    });
                }

                let record = ConsentRecord {
                    id: ConsentId::new(),
                    key: transition.key.clone(),
                    status: transition.to,
                    granted_at: transition.to.is_active().then_some(transition.effective_at),
                    expires_at: transition.expires_at,
                    version: 1,
                    evidence_hash: transition.evidence_digest(),
                };
                slot.insert(record.clone());
                (record, None)
            },
        };

        debug!(
            key = %record.key,
            from = from.map_or("none", ConsentStatus::as_str),
            to = %record.status,
            version = record.version,
            "Applied consent transition"
        );

        let fact = LifecycleFact {
            consent_id: record.id.clone(),
            key: record.key.clone(),
            from,
            to: record.status,
            version: record.version,
            effective_at: transition.effective_at,
            evidence_hash: record.evidence_hash,
        };

        Ok((record, fact))
    }

    /// Look up the current record for a key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockPoisoned`] if a writer panicked.
    pub fn get(&self, key: &ConsentKey) -> StoreResult<Option<ConsentRecord>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.get(key).cloned())
    }

    /// Take an immutable snapshot of the entire store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockPoisoned`] if a writer panicked.
    pub fn snapshot(&self) -> StoreResult<ConsentSnapshot> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(ConsentSnapshot::new(records.clone()))
    }

    /// Active records whose validity window elapsed before `at`.
    ///
    /// Input to the expiry sweeper; the sweeper applies `Expired` through
    /// [`ConsentStore::apply`] so the transition is audited like any other.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockPoisoned`] if a writer panicked.
    pub fn expiring_before(&self, at: Timestamp) -> StoreResult<Vec<ConsentRecord>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records
            .values()
            .filter(|r| r.status.is_active())
            .filter(|r| r.expires_at.is_some_and(|expiry| expiry < at))
            .cloned()
            .collect())
    }

    /// Number of records (current versions) in the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockPoisoned`] if a writer panicked.
    pub fn len(&self) -> StoreResult<usize> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.len())
    }

    /// Whether the store holds no records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockPoisoned`] if a writer panicked.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sammati_core::{FiduciaryId, PurposeId, UserId};

    fn key() -> ConsentKey {
        ConsentKey::new(
            UserId::new("u1"),
            FiduciaryId::new("f1"),
            PurposeId::new("marketing"),
        )
    }

    fn transition(to: ConsentStatus) -> ConsentTransition {
        ConsentTransition {
            key: key(),
            expected_from: None,
            to,
            effective_at: Timestamp::now(),
            expires_at: None,
        }
    }

    #[test]
    fn test_first_grant_creates_record() {
        let store = ConsentStore::new();

        let (record, fact) = store.apply(&transition(ConsentStatus::Granted)).unwrap();

        assert_eq!(record.status, ConsentStatus::Granted);
        assert_eq!(record.version, 1);
        assert!(record.granted_at.is_some());
        assert_eq!(fact.from, None);
        assert_eq!(fact.to, ConsentStatus::Granted);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_deny_creates_terminal_record() {
        let store = ConsentStore::new();

        let (record, _) = store.apply(&transition(ConsentStatus::Denied)).unwrap();
        assert_eq!(record.status, ConsentStatus::Denied);

        // Terminal: nothing moves a denied record.
        let err = store.apply(&transition(ConsentStatus::Granted)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_withdraw_is_one_way() {
        let store = ConsentStore::new();
        store.apply(&transition(ConsentStatus::Granted)).unwrap();
        store.apply(&transition(ConsentStatus::Withdrawn)).unwrap();

        let err = store.apply(&transition(ConsentStatus::Granted)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition {
                from: ConsentStatus::Withdrawn,
                to: ConsentStatus::Granted,
                ..
            }
        ));
    }

    #[test]
    fn test_absent_key_rejects_non_birth_transition() {
        let store = ConsentStore::new();

        let err = store
            .apply(&transition(ConsentStatus::Withdrawn))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_optimistic_guard() {
        let store = ConsentStore::new();
        store.apply(&transition(ConsentStatus::Granted)).unwrap();

        let mut guarded = transition(ConsentStatus::Withdrawn);
        guarded.expected_from = Some(ConsentStatus::Renewed);
        let err = store.apply(&guarded).unwrap_err();
        assert!(matches!(
            err,
            StoreError::StaleExpectation {
                current: ConsentStatus::Granted,
                ..
            }
        ));

        // Matching expectation goes through.
        guarded.expected_from = Some(ConsentStatus::Granted);
        store.apply(&guarded).unwrap();
    }

    #[test]
    fn test_version_increments_and_id_is_stable() {
        let store = ConsentStore::new();
        let (v1, _) = store.apply(&transition(ConsentStatus::Granted)).unwrap();
        let (v2, _) = store.apply(&transition(ConsentStatus::Renewed)).unwrap();
        let (v3, _) = store.apply(&transition(ConsentStatus::Withdrawn)).unwrap();

        assert_eq!((v1.version, v2.version, v3.version), (1, 2, 3));
        assert_eq!(v1.id, v3.id);
    }

    #[test]
    fn test_renewal_cycle() {
        let store = ConsentStore::new();
        store.apply(&transition(ConsentStatus::Granted)).unwrap();
        store.apply(&transition(ConsentStatus::Renewed)).unwrap();
        let (record, _) = store.apply(&transition(ConsentStatus::Granted)).unwrap();
        assert_eq!(record.status, ConsentStatus::Granted);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let store = ConsentStore::new();
        store.apply(&transition(ConsentStatus::Granted)).unwrap();

        let snapshot = store.snapshot().unwrap();
        store.apply(&transition(ConsentStatus::Withdrawn)).unwrap();

        assert_eq!(
            snapshot.get(&key()).unwrap().status,
            ConsentStatus::Granted
        );
        assert_eq!(
            store.get(&key()).unwrap().unwrap().status,
            ConsentStatus::Withdrawn
        );
    }

    #[test]
    fn test_expiring_before_lists_lapsed_grants() {
        let store = ConsentStore::new();

        let mut bounded = transition(ConsentStatus::Granted);
        bounded.expires_at = Some(Timestamp::from_datetime(Utc::now() - Duration::hours(1)));
        store.apply(&bounded).unwrap();

        let lapsed = store.expiring_before(Timestamp::now()).unwrap();
        assert_eq!(lapsed.len(), 1);
        assert_eq!(lapsed[0].key, key());

        // After the expiry transition the record no longer shows up.
        store.apply(&transition(ConsentStatus::Expired)).unwrap();
        assert!(store.expiring_before(Timestamp::now()).unwrap().is_empty());
    }
}
