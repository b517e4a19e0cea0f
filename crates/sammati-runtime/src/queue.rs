//! The bounded audit queue and its single writer task.
//!
//! Validation returns its decision synchronously and enqueues the
//! corresponding audit fact here. Dropping a fact would be a correctness
//! violation, not a best-effort loss, so the channel is bounded with
//! backpressure: a full queue surfaces to the `validate` caller instead of
//! discarding anything. One writer task drains the queue in order, which
//! preserves decision order in the ledger.

use sammati_core::{ActorId, ConsentId, RequestId, Timestamp, ValidationId};
use sammati_engine::ValidationReason;
use sammati_ledger::{AuditAction, AuditLedger};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Default capacity of the decision audit queue.
pub const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 1024;

const RETRY_INITIAL: Duration = Duration::from_millis(50);
const RETRY_CAP: Duration = Duration::from_secs(5);

/// A validation decision on its way to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DecisionFact {
    pub(crate) validation_id: ValidationId,
    pub(crate) request_id: RequestId,
    pub(crate) actor_id: ActorId,
    pub(crate) key: sammati_core::ConsentKey,
    pub(crate) is_valid: bool,
    pub(crate) reason: ValidationReason,
    pub(crate) matched_consent_id: Option<ConsentId>,
    pub(crate) expires_at: Option<Timestamp>,
    pub(crate) requested_at: Timestamp,
    pub(crate) evaluated_at: Timestamp,
}

impl DecisionFact {
    fn resource_id(&self) -> String {
        self.request_id.to_string()
    }
}

/// Spawn the single writer task that drains decision facts into the ledger.
///
/// Delivery is eventual and order-preserving: on a failed append the task
/// retries the same fact with capped exponential backoff (the ledger itself
/// never retries — that policy lives here, at the caller). Appends run on
/// the blocking pool, since the durable backend fsyncs per entry; the async
/// worker thread is never parked on disk. The task ends when every sender
/// handle is dropped and the queue is empty.
pub(crate) fn spawn_writer(
    ledger: Arc<AuditLedger>,
    mut rx: mpsc::Receiver<DecisionFact>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(fact) = rx.recv().await {
            let details = match serde_json::to_value(&fact) {
                Ok(value) => value,
                Err(err) => {
                    // Cannot happen for facts this crate constructs.
                    warn!(error = %err, "Unserializable decision fact dropped");
                    continue;
                },
            };

            let mut delay = RETRY_INITIAL;
            loop {
                let ledger = Arc::clone(&ledger);
                let actor_id = fact.actor_id.clone();
                let resource_id = fact.resource_id();
                let payload = details.clone();
                let appended = tokio::task::spawn_blocking(move || {
                    ledger.append(actor_id, AuditAction::ValidationDecided, resource_id, payload)
                })
                .await;

                match appended {
                    Ok(Ok(entry)) => {
                        trace!(
                            block_index = entry.block_index,
                            request_id = %fact.request_id,
                            "Recorded validation decision"
                        );
                        break;
                    },
                    Ok(Err(err)) => {
                        warn!(
                            error = %err,
                            request_id = %fact.request_id,
                            retry_in_ms = delay.as_millis() as u64,
                            "Ledger append failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        delay = delay.saturating_mul(2).min(RETRY_CAP);
                    },
                    Err(err) => {
                        // The append closure panicked; the writer lock may be
                        // poisoned, so retrying this fact cannot succeed.
                        warn!(
                            error = %err,
                            request_id = %fact.request_id,
                            "Ledger append task failed, dropping fact"
                        );
                        break;
                    },
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sammati_core::{ConsentKey, FiduciaryId, PurposeId, UserId};
    use std::time::Duration;

    fn fact(seq: u32) -> DecisionFact {
        DecisionFact {
            validation_id: ValidationId::new(),
            request_id: RequestId::new(),
            actor_id: ActorId::new(format!("u{seq}")),
            key: ConsentKey::new(
                UserId::new(format!("u{seq}")),
                FiduciaryId::new("f1"),
                PurposeId::new("marketing"),
            ),
            is_valid: true,
            reason: ValidationReason::Valid,
            matched_consent_id: None,
            expires_at: None,
            requested_at: Timestamp::now(),
            evaluated_at: Timestamp::now(),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_writer_drains_facts_in_order() {
        let ledger = Arc::new(AuditLedger::in_memory());
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_writer(Arc::clone(&ledger), rx);

        for seq in 0..3 {
            tx.send(fact(seq)).await.unwrap();
        }
        drop(tx);

        // The task ends once the queue is drained.
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 3);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.block_index, i as u64);
            assert_eq!(entry.action, AuditAction::ValidationDecided);
            assert_eq!(entry.actor_id, ActorId::new(format!("u{i}")));
        }
        assert!(ledger.verify().unwrap().ok);
    }
}
