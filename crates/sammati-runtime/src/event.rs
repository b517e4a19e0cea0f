//! Consent mutation events from external collection flows.

use sammati_core::{ActorId, ConsentKey, ConsentStatus, Timestamp};
use sammati_store::ConsentTransition;
use serde::{Deserialize, Serialize};

/// What an external consent-collection flow asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentAction {
    /// Grant consent (first grant, or re-grant after renewal).
    Grant,
    /// Withdraw a granted consent.
    Withdraw,
    /// Renew a granted consent.
    Renew,
    /// Deny consent.
    Deny,
}

impl ConsentAction {
    /// The status this action drives the record into.
    #[must_use]
    pub fn target_status(self) -> ConsentStatus {
        match self {
            Self::Grant => ConsentStatus::Granted,
            Self::Withdraw => ConsentStatus::Withdrawn,
            Self::Renew => ConsentStatus::Renewed,
            Self::Deny => ConsentStatus::Denied,
        }
    }
}

/// A consent mutation event produced by an external collection flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentEvent {
    /// The consent key being mutated.
    pub key: ConsentKey,
    /// The requested action.
    pub action: ConsentAction,
    /// When the mutation takes effect.
    pub effective_at: Timestamp,
    /// Validity bound for grants/renewals.
    pub expires_at: Option<Timestamp>,
    /// Optimistic guard: only apply if the record currently holds this
    /// status.
    pub expected_from: Option<ConsentStatus>,
}

impl ConsentEvent {
    /// Create an event taking effect now.
    #[must_use]
    pub fn new(key: ConsentKey, action: ConsentAction) -> Self {
        Self {
            key,
            action,
            effective_at: Timestamp::now(),
            expires_at: None,
            expected_from: None,
        }
    }

    /// Set a validity bound.
    #[must_use]
    pub fn expiring_at(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// The actor recorded on the resulting audit entry: the data principal
    /// named by the key.
    #[must_use]
    pub fn actor(&self) -> ActorId {
        ActorId::new(self.key.user_id.as_str())
    }

    /// Lower the event to a store transition.
    #[must_use]
    pub fn to_transition(&self) -> ConsentTransition {
        ConsentTransition {
            key: self.key.clone(),
            expected_from: self.expected_from,
            to: self.action.target_status(),
            effective_at: self.effective_at,
            expires_at: self.expires_at,
        }
    }
}
