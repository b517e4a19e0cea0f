//! The periodic expiry sweeper.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::service::ConsentService;

/// Spawn the background task that periodically expires lapsed consents.
///
/// Each tick runs one sweep through [`ConsentService::sweep_expired_once`],
/// so every expiry goes through the normal transition path and is audited
/// like a user-driven withdrawal. A failed sweep is logged and retried on
/// the next tick; the task runs until the runtime shuts down.
///
/// Must be called within a tokio runtime.
pub fn spawn_expiry_sweeper(service: Arc<ConsentService>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match service.sweep_expired_once() {
                Ok(0) => {},
                Ok(expired) => debug!(expired, "Expiry sweep completed"),
                Err(err) => warn!(error = %err, "Expiry sweep failed, will retry next tick"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ConsentAction, ConsentEvent};
    use chrono::{Duration as ChronoDuration, Utc};
    use sammati_core::{ConsentKey, ConsentStatus, FiduciaryId, PurposeId, Timestamp, UserId};
    use sammati_ledger::AuditLedger;

    fn key() -> ConsentKey {
        ConsentKey::new(
            UserId::new("u1"),
            FiduciaryId::new("f1"),
            PurposeId::new("marketing"),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_expires_on_tick() {
        let ledger = Arc::new(AuditLedger::in_memory());
        let (service, _rx) = ConsentService::with_manual_queue(ledger, 8);
        let service = Arc::new(service);

        let lapsed = Timestamp::from_datetime(Utc::now() - ChronoDuration::hours(1));
        service
            .apply_event(&ConsentEvent::new(key(), ConsentAction::Grant).expiring_at(lapsed))
            .unwrap();

        let handle = spawn_expiry_sweeper(Arc::clone(&service), Duration::from_secs(60));

        // The first tick fires immediately; advancing past it lets the
        // sweep run under the paused clock.
        tokio::time::advance(Duration::from_millis(1)).await;
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if service.store().get(&key()).unwrap().unwrap().status == ConsentStatus::Expired {
                break;
            }
        }

        let record = service.store().get(&key()).unwrap().unwrap();
        assert_eq!(record.status, ConsentStatus::Expired);

        handle.abort();
    }
}
