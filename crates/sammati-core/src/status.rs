//! The consent status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a consent record.
///
/// The variants are mutually exclusive; only [`ConsentStatus::Granted`] and
/// [`ConsentStatus::Renewed`] authorize processing. The legal transitions
/// are enforced by [`ConsentStatus::can_transition_to`] — call sites never
/// get to invent their own lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    /// Requested but not yet decided. Initial state of every record.
    Pending,
    /// The principal granted consent.
    Granted,
    /// The principal denied consent. Terminal.
    Denied,
    /// The principal withdrew a previously granted consent.
    Withdrawn,
    /// The consent's validity window has elapsed.
    Expired,
    /// The consent was renewed before (or after) expiry.
    Renewed,
}

impl ConsentStatus {
    /// Whether this status authorizes processing.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Granted | Self::Renewed)
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Denied)
    }

    /// Whether moving from `self` to `to` is a legal transition.
    ///
    /// The full table:
    ///
    /// | from      | to                               |
    /// |-----------|----------------------------------|
    /// | `Pending` | `Granted`, `Denied`              |
    /// | `Granted` | `Withdrawn`, `Expired`, `Renewed`|
    /// | `Renewed` | `Granted`, `Withdrawn`, `Expired`|
    ///
    /// Everything else — including `Withdrawn -> Granted` (withdrawal is
    /// one-way) and any transition out of `Denied` — is illegal.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Granted | Self::Denied)
                | (Self::Granted, Self::Withdrawn | Self::Expired | Self::Renewed)
                | (Self::Renewed, Self::Granted | Self::Withdrawn | Self::Expired)
        )
    }

    /// Stable lowercase name, matching the serde encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Withdrawn => "withdrawn",
            Self::Expired => "expired",
            Self::Renewed => "renewed",
        }
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
