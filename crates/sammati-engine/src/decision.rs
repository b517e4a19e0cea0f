//! The validation decision algorithm.

use sammati_core::{ConsentId, ConsentStatus, RequestId, Timestamp};
use sammati_store::ConsentSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use crate::request::ValidationRequest;

/// Why a validation decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    /// An active consent covers the request.
    Valid,
    /// No record exists for the key.
    NoConsentFound,
    /// The matched consent's validity window has elapsed.
    ConsentExpired,
    /// The principal withdrew consent.
    ConsentWithdrawn,
    /// The principal denied consent.
    ConsentDenied,
    /// A record exists but its status does not authorize processing
    /// (e.g. still pending).
    NotAuthorized,
}

impl ValidationReason {
    /// Stable lowercase name, matching the serde encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::NoConsentFound => "no_consent_found",
            Self::ConsentExpired => "consent_expired",
            Self::ConsentWithdrawn => "consent_withdrawn",
            Self::ConsentDenied => "consent_denied",
            Self::NotAuthorized => "not_authorized",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The engine's verdict on a [`ValidationRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The request this result answers.
    pub request_id: RequestId,
    /// Whether processing is currently authorized.
    pub is_valid: bool,
    /// Justification for the verdict.
    pub reason: ValidationReason,
    /// The consent record that authorized the request, when valid.
    pub matched_consent_id: Option<ConsentId>,
    /// Validity bound of the matched consent, when one applies.
    pub expires_at: Option<Timestamp>,
    /// When the engine evaluated the request.
    pub evaluated_at: Timestamp,
}

/// Decide whether the requested processing is authorized.
///
/// Pure over its inputs: the same request against the same snapshot yields
/// the same verdict (only `evaluated_at` differs). Safe to call concurrently
/// and repeatedly; performs no mutation. Read-time expiry is a decision, not
/// a store transition — the sweeper applies `Expired` separately.
#[must_use]
pub fn validate(request: &ValidationRequest, snapshot: &ConsentSnapshot) -> ValidationResult {
    let evaluated_at = Timestamp::now();

    let (is_valid, reason, matched_consent_id, expires_at) = match snapshot.get(&request.key) {
        None => (false, ValidationReason::NoConsentFound, None, None),
        Some(record) => match record.status {
            ConsentStatus::Denied => (false, ValidationReason::ConsentDenied, None, None),
            ConsentStatus::Withdrawn => (false, ValidationReason::ConsentWithdrawn, None, None),
            ConsentStatus::Granted | ConsentStatus::Renewed => {
                if let Some(expiry) = record.expires_at
                    && request.requested_at > expiry
                {
                    (false, ValidationReason::ConsentExpired, None, Some(expiry))
                } else {
                    (
                        true,
                        ValidationReason::Valid,
                        Some(record.id.clone()),
                        record.expires_at,
                    )
                }
            },
            ConsentStatus::Expired => (false, ValidationReason::ConsentExpired, None, None),
            ConsentStatus::Pending => (false, ValidationReason::NotAuthorized, None, None),
        },
    };

    trace!(
        request_id = %request.request_id,
        key = %request.key,
        is_valid,
        reason = %reason,
        "Validation decided"
    );

    ValidationResult {
        request_id: request.request_id.clone(),
        is_valid,
        reason,
        matched_consent_id,
        expires_at,
        evaluated_at,
    }
}
