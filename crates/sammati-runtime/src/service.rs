//! The consent service handle.

use sammati_core::{ConsentRecord, Timestamp, ValidationId};
use sammati_engine::{ValidationReason, ValidationRequest, validate};
use sammati_ledger::{AuditAction, AuditLedger, AuditQuery, ChainVerificationReport};
use sammati_store::{ConsentStore, LifecycleFact};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{RuntimeError, RuntimeResult};
use crate::event::ConsentEvent;
use crate::queue::{DEFAULT_AUDIT_QUEUE_CAPACITY, DecisionFact, spawn_writer};

/// The response handed to external validation callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Identifier of this recorded decision.
    pub validation_id: ValidationId,
    /// Whether processing is currently authorized.
    pub is_valid: bool,
    /// Justification for the verdict.
    pub reason: ValidationReason,
    /// The consent record that authorized the request, when valid.
    pub consent_id: Option<sammati_core::ConsentId>,
    /// Validity bound of the matched consent, when one applies.
    pub expires_at: Option<Timestamp>,
    /// When the engine evaluated the request.
    pub evaluated_at: Timestamp,
}

/// Handle to the consent validation core.
///
/// Owns the consent store, the audit ledger, and the sending side of the
/// bounded decision audit queue. Clone-cheap via `Arc` at the call sites
/// that need it; there are no process-wide singletons.
pub struct ConsentService {
    store: Arc<ConsentStore>,
    ledger: Arc<AuditLedger>,
    audit_tx: mpsc::Sender<DecisionFact>,
}

impl ConsentService {
    /// Create a service over the given ledger with the default audit queue
    /// capacity, spawning the ledger writer task.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new(ledger: Arc<AuditLedger>) -> Self {
        Self::with_queue_capacity(ledger, DEFAULT_AUDIT_QUEUE_CAPACITY)
    }

    /// Create a service with an explicit audit queue capacity.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn with_queue_capacity(ledger: Arc<AuditLedger>, capacity: usize) -> Self {
        let (audit_tx, audit_rx) = mpsc::channel(capacity);
        spawn_writer(Arc::clone(&ledger), audit_rx);
        Self {
            store: Arc::new(ConsentStore::new()),
            ledger,
            audit_tx,
        }
    }

    /// Test constructor: no writer task; the receiver is handed back so a
    /// test can hold the queue full or drain it by hand.
    #[cfg(test)]
    pub(crate) fn with_manual_queue(
        ledger: Arc<AuditLedger>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<DecisionFact>) {
        let (audit_tx, audit_rx) = mpsc::channel(capacity);
        let service = Self {
            store: Arc::new(ConsentStore::new()),
            ledger,
            audit_tx,
        };
        (service, audit_rx)
    }

    /// The underlying consent store.
    #[must_use]
    pub fn store(&self) -> &Arc<ConsentStore> {
        &self.store
    }

    /// The underlying audit ledger.
    #[must_use]
    pub fn ledger(&self) -> &Arc<AuditLedger> {
        &self.ledger
    }

    /// Apply a consent mutation event.
    ///
    /// The store transition and its audit entry are handled fail-closed:
    /// the lifecycle fact is appended to the ledger synchronously, and a
    /// failed append surfaces immediately as
    /// [`sammati_ledger::LedgerError::WriteFailed`].
    ///
    /// # Errors
    ///
    /// Returns a store error if the transition is illegal, or a ledger
    /// error if the lifecycle fact cannot be recorded.
    pub fn apply_event(&self, event: &ConsentEvent) -> RuntimeResult<ConsentRecord> {
        let (record, fact) = self.store.apply(&event.to_transition())?;
        let action = lifecycle_action(&fact)?;

        let details =
            serde_json::to_value(&fact).map_err(|e| {
                RuntimeError::Ledger(sammati_ledger::LedgerError::Serialization(e.to_string()))
            })?;

        self.ledger
            .append(event.actor(), action, record.id.to_string(), details)?;

        debug!(key = %record.key, status = %record.status, "Consent event applied");
        Ok(record)
    }

    /// Validate a processing request.
    ///
    /// The decision is computed synchronously over a fresh store snapshot
    /// and never blocks on the ledger; the decision fact is enqueued for
    /// the writer task. If the queue is full the caller gets
    /// [`RuntimeError::AuditBacklog`] and no decision — a decision without
    /// a guaranteed audit trail must not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::AuditBacklog`] under audit backpressure, or
    /// [`RuntimeError::AuditChannelClosed`] if the writer task is gone.
    pub fn validate(&self, request: &ValidationRequest) -> RuntimeResult<ValidationResponse> {
        let snapshot = self.store.snapshot()?;
        let result = validate(request, &snapshot);

        let fact = DecisionFact {
            validation_id: ValidationId::new(),
            request_id: result.request_id.clone(),
            actor_id: sammati_core::ActorId::new(request.key.user_id.as_str()),
            key: request.key.clone(),
            is_valid: result.is_valid,
            reason: result.reason,
            matched_consent_id: result.matched_consent_id.clone(),
            expires_at: result.expires_at,
            requested_at: request.requested_at,
            evaluated_at: result.evaluated_at,
        };
        let validation_id = fact.validation_id.clone();

        self.audit_tx.try_send(fact).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => RuntimeError::AuditBacklog,
            mpsc::error::TrySendError::Closed(_) => RuntimeError::AuditChannelClosed,
        })?;

        Ok(ValidationResponse {
            validation_id,
            is_valid: result.is_valid,
            reason: result.reason,
            consent_id: result.matched_consent_id,
            expires_at: result.expires_at,
            evaluated_at: result.evaluated_at,
        })
    }

    /// Run one expiry sweep: every active record whose window elapsed is
    /// transitioned to `Expired` through the normal store path and audited
    /// like any other transition.
    ///
    /// A record that changes state between the scan and the transition
    /// (e.g. the principal withdraws concurrently) is skipped; the guard
    /// loses that race on purpose.
    ///
    /// # Errors
    ///
    /// Returns a store or ledger error if a transition or its audit append
    /// fails.
    pub fn sweep_expired_once(&self) -> RuntimeResult<usize> {
        use sammati_store::{ConsentTransition, StoreError};

        let now = Timestamp::now();
        let mut expired = 0usize;

        for record in self.store.expiring_before(now)? {
            let transition = ConsentTransition {
                key: record.key.clone(),
                expected_from: Some(record.status),
                to: sammati_core::ConsentStatus::Expired,
                effective_at: now,
                expires_at: None,
            };

            let (record, fact) = match self.store.apply(&transition) {
                Ok(applied) => applied,
                Err(StoreError::StaleExpectation { .. }) => continue,
                Err(err) => return Err(err.into()),
            };

            let details = serde_json::to_value(&fact).map_err(|e| {
                RuntimeError::Ledger(sammati_ledger::LedgerError::Serialization(e.to_string()))
            })?;
            self.ledger.append(
                sammati_core::ActorId::system("expiry-sweeper"),
                AuditAction::ConsentExpired,
                record.id.to_string(),
                details,
            )?;

            expired = expired.saturating_add(1);
        }

        if expired > 0 {
            debug!(expired, "Expiry sweep applied transitions");
        }
        Ok(expired)
    }

    /// Query the audit trail.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if entries cannot be loaded.
    pub fn audit_query(
        &self,
        filter: &AuditQuery,
    ) -> RuntimeResult<Vec<sammati_ledger::AuditEntry>> {
        Ok(self.ledger.query(filter)?)
    }

    /// Verify the full audit chain from genesis.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if entries cannot be loaded; a broken chain
    /// is reported in the result, not as an error.
    pub fn verify_ledger(&self) -> RuntimeResult<ChainVerificationReport> {
        Ok(self.ledger.verify()?)
    }
}

impl std::fmt::Debug for ConsentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentService").finish_non_exhaustive()
    }
}

/// Map an applied lifecycle fact to its audit action.
///
/// The transition table permits no move into `Pending`, and a record is
/// never born `Pending` through `apply`; if that invariant ever breaks the
/// mismatch is reported as a typed error, not a panic.
fn lifecycle_action(fact: &LifecycleFact) -> RuntimeResult<AuditAction> {
    use sammati_core::ConsentStatus;

    match fact.to {
        ConsentStatus::Granted => Ok(AuditAction::ConsentGranted),
        ConsentStatus::Denied => Ok(AuditAction::ConsentDenied),
        ConsentStatus::Withdrawn => Ok(AuditAction::ConsentWithdrawn),
        ConsentStatus::Renewed => Ok(AuditAction::ConsentRenewed),
        ConsentStatus::Expired => Ok(AuditAction::ConsentExpired),
        ConsentStatus::Pending => Err(RuntimeError::UnauditableStatus(fact.to)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ConsentAction, ConsentEvent};
    use chrono::{Duration, Utc};
    use sammati_core::{ConsentKey, FiduciaryId, PurposeId, UserId};

    fn key() -> ConsentKey {
        ConsentKey::new(
            UserId::new("u1"),
            FiduciaryId::new("f1"),
            PurposeId::new("marketing"),
        )
    }

    fn ts(days: i64) -> Timestamp {
        Timestamp::from_datetime(Utc::now() + Duration::days(days))
    }

    #[tokio::test]
    async fn test_apply_event_appends_lifecycle_fact() {
        let ledger = Arc::new(AuditLedger::in_memory());
        let (service, _rx) = ConsentService::with_manual_queue(Arc::clone(&ledger), 8);

        let record = service
            .apply_event(&ConsentEvent::new(key(), ConsentAction::Grant).expiring_at(ts(30)))
            .unwrap();

        assert_eq!(record.status, sammati_core::ConsentStatus::Granted);

        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::ConsentGranted);
        assert_eq!(entries[0].resource_id, record.id.to_string());
        assert!(ledger.verify().unwrap().ok);
    }

    #[tokio::test]
    async fn test_validate_enqueues_decision_fact() {
        let ledger = Arc::new(AuditLedger::in_memory());
        let (service, mut rx) = ConsentService::with_manual_queue(Arc::clone(&ledger), 8);

        service
            .apply_event(&ConsentEvent::new(key(), ConsentAction::Grant))
            .unwrap();

        let request = ValidationRequest::at(key(), Timestamp::now());
        let response = service.validate(&request).unwrap();
        assert!(response.is_valid);
        assert_eq!(response.reason, ValidationReason::Valid);
        assert!(response.consent_id.is_some());

        let fact = rx.try_recv().unwrap();
        assert_eq!(fact.request_id, request.request_id);
        assert!(fact.is_valid);
        assert_eq!(fact.validation_id, response.validation_id);
    }

    #[tokio::test]
    async fn test_audit_backlog_surfaces_to_caller() {
        let ledger = Arc::new(AuditLedger::in_memory());
        // Capacity 1, and the receiver is held without draining.
        let (service, _rx) = ConsentService::with_manual_queue(ledger, 1);

        service
            .apply_event(&ConsentEvent::new(key(), ConsentAction::Grant))
            .unwrap();

        let request = ValidationRequest::at(key(), Timestamp::now());
        service.validate(&request).unwrap();

        // Queue is now full: the decision must be withheld, not the fact
        // dropped.
        let err = service.validate(&request).unwrap_err();
        assert!(matches!(err, RuntimeError::AuditBacklog));
    }

    #[tokio::test]
    async fn test_closed_queue_surfaces_to_caller() {
        let ledger = Arc::new(AuditLedger::in_memory());
        let (service, rx) = ConsentService::with_manual_queue(ledger, 1);
        drop(rx);

        let request = ValidationRequest::at(key(), Timestamp::now());
        let err = service.validate(&request).unwrap_err();
        assert!(matches!(err, RuntimeError::AuditChannelClosed));
    }

    #[tokio::test]
    async fn test_sweep_expires_lapsed_grants() {
        let ledger = Arc::new(AuditLedger::in_memory());
        let (service, _rx) = ConsentService::with_manual_queue(Arc::clone(&ledger), 8);

        service
            .apply_event(&ConsentEvent::new(key(), ConsentAction::Grant).expiring_at(ts(-1)))
            .unwrap();

        let expired = service.sweep_expired_once().unwrap();
        assert_eq!(expired, 1);

        let record = service.store().get(&key()).unwrap().unwrap();
        assert_eq!(record.status, sammati_core::ConsentStatus::Expired);

        // The sweep is audited like any other transition.
        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].action, AuditAction::ConsentExpired);
        assert_eq!(entries[1].actor_id.as_str(), "system:expiry-sweeper");
        assert!(ledger.verify().unwrap().ok);

        // Idempotent: nothing left to expire.
        assert_eq!(service.sweep_expired_once().unwrap(), 0);
    }

    #[test]
    fn test_lifecycle_action_covers_every_transition_target() {
        use sammati_core::{ConsentId, ConsentStatus, ContentDigest};

        let fact = |to| LifecycleFact {
            consent_id: ConsentId::new(),
            key: key(),
            from: None,
            to,
            version: 1,
            effective_at: Timestamp::now(),
            evidence_hash: ContentDigest::zero(),
        };

        for (to, action) in [
            (ConsentStatus::Granted, AuditAction::ConsentGranted),
            (ConsentStatus::Denied, AuditAction::ConsentDenied),
            (ConsentStatus::Withdrawn, AuditAction::ConsentWithdrawn),
            (ConsentStatus::Renewed, AuditAction::ConsentRenewed),
            (ConsentStatus::Expired, AuditAction::ConsentExpired),
        ] {
            assert_eq!(lifecycle_action(&fact(to)).unwrap(), action);
        }

        // No transition targets `Pending`; a fact claiming one is a typed
        // error, not a panic.
        let err = lifecycle_action(&fact(ConsentStatus::Pending)).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::UnauditableStatus(ConsentStatus::Pending)
        ));
    }

    #[tokio::test]
    async fn test_invalid_transition_is_reported_not_coerced() {
        let ledger = Arc::new(AuditLedger::in_memory());
        let (service, _rx) = ConsentService::with_manual_queue(Arc::clone(&ledger), 8);

        service
            .apply_event(&ConsentEvent::new(key(), ConsentAction::Grant))
            .unwrap();
        service
            .apply_event(&ConsentEvent::new(key(), ConsentAction::Withdraw))
            .unwrap();

        let err = service
            .apply_event(&ConsentEvent::new(key(), ConsentAction::Grant))
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Store(sammati_store::StoreError::InvalidTransition { .. })
        ));

        // The failed mutation produced no audit entry.
        assert_eq!(ledger.entries().unwrap().len(), 2);
    }
}
