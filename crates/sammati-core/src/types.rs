//! Common identifier and time types used throughout Sammati.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a data principal (the person whose data is processed).
///
/// Opaque to Sammati; assigned by the external identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Create a user ID from an external identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Identifier of a data fiduciary (the entity requesting processing).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiduciaryId(pub String);

impl FiduciaryId {
    /// Create a fiduciary ID from an external identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FiduciaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fiduciary:{}", self.0)
    }
}

/// Identifier of a processing purpose (e.g. `"marketing"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurposeId(pub String);

impl PurposeId {
    /// Create a purpose ID from an external identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PurposeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "purpose:{}", self.0)
    }
}

/// Identifier of the actor recorded on an audit entry.
///
/// May name a user, a fiduciary system, or an internal task such as the
/// expiry sweeper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    /// Create an actor ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Actor ID for system-initiated actions (e.g. the expiry sweeper).
    #[must_use]
    pub fn system(task: &str) -> Self {
        Self(format!("system:{task}"))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity key of a consent record.
///
/// At most one *current* [`crate::ConsentRecord`] exists per key; superseded
/// versions are never deleted, only replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsentKey {
    /// The data principal.
    pub user_id: UserId,
    /// The data fiduciary.
    pub fiduciary_id: FiduciaryId,
    /// The processing purpose.
    pub purpose_id: PurposeId,
}

impl ConsentKey {
    /// Create a consent key.
    #[must_use]
    pub fn new(user_id: UserId, fiduciary_id: FiduciaryId, purpose_id: PurposeId) -> Self {
        Self {
            user_id,
            fiduciary_id,
            purpose_id,
        }
    }
}

impl fmt::Display for ConsentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.user_id.0, self.fiduciary_id.0, self.purpose_id.0
        )
    }
}

/// Surrogate identifier of a consent record, used for audit linkage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsentId(pub Uuid);

impl ConsentId {
    /// Create a new random consent ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a consent ID from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ConsentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConsentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "consent:{}", self.0)
    }
}

/// Identifier of a validation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Create a new random request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a request ID from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request:{}", self.0)
    }
}

/// Identifier of a recorded validation decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationId(pub Uuid);

impl ValidationId {
    /// Create a new random validation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a validation ID from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ValidationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ValidationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation:{}", self.0)
    }
}

/// Timestamp wrapper for consistent handling throughout Sammati.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Get the current timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Check if this timestamp is in the past.
    #[must_use]
    pub fn is_past(&self) -> bool {
        self.0 < Utc::now()
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    /// RFC 3339 rendering with microsecond precision.
    ///
    /// This is the encoding used inside hashed audit payloads, so it must
    /// stay byte-stable for a given instant.
    #[must_use]
    pub fn to_rfc3339_micros(&self) -> String {
        self.0
            .to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339_micros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_consent_key_equality() {
        let a = ConsentKey::new(
            UserId::new("u1"),
            FiduciaryId::new("f1"),
            PurposeId::new("marketing"),
        );
        let b = ConsentKey::new(
            UserId::new("u1"),
            FiduciaryId::new("f1"),
            PurposeId::new("marketing"),
        );
        let c = ConsentKey::new(
            UserId::new("u1"),
            FiduciaryId::new("f1"),
            PurposeId::new("analytics"),
        );

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_timestamp_rfc3339_stable() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let ts = Timestamp::from_datetime(dt);

        assert_eq!(ts.to_rfc3339_micros(), "2026-03-14T09:26:53.000000Z");
        assert_eq!(ts.to_rfc3339_micros(), ts.to_rfc3339_micros());
    }

    #[test]
    fn test_timestamp_ordering() {
        let early = Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let late = Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap());

        assert!(early < late);
        assert!(early.is_past());
    }

    #[test]
    fn test_id_serde_roundtrip() {
        let id = ConsentId::new();
        let json = serde_json::to_string(&id).unwrap();
        let decoded: ConsentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, decoded);
    }
}
