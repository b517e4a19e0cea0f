//! Validation requests.

use sammati_core::{ConsentKey, FiduciaryId, PurposeId, RequestId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A request to validate that processing is currently authorized.
///
/// Immutable once issued; the engine evaluates temporal validity against
/// `requested_at`, not against its own clock, so replaying a request yields
/// the same decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Unique request identifier, echoed on the result.
    pub request_id: RequestId,
    /// The consent key to check.
    pub key: ConsentKey,
    /// The instant the request was issued.
    pub requested_at: Timestamp,
}

impl ValidationRequest {
    /// Create a request for the given key, timestamped now.
    #[must_use]
    pub fn new(user_id: UserId, fiduciary_id: FiduciaryId, purpose_id: PurposeId) -> Self {
        Self {
            request_id: RequestId::new(),
            key: ConsentKey::new(user_id, fiduciary_id, purpose_id),
            requested_at: Timestamp::now(),
        }
    }

    /// Create a request with an explicit issue time.
    #[must_use]
    pub fn at(key: ConsentKey, requested_at: Timestamp) -> Self {
        Self {
            request_id: RequestId::new(),
            key,
            requested_at,
        }
    }
}
