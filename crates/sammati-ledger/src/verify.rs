//! Independent chain integrity verification.
//!
//! Verification recomputes the chain genesis-to-tip every time it runs. It
//! needs no write access and trusts no cached head — detectability of
//! tampering must not depend on any single party's memory.

use sammati_core::ContentDigest;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::entry::{AuditEntry, GENESIS_PREVIOUS_HASH};

/// What exactly is wrong at the first bad index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainIssue {
    /// The entry's stored hash does not match its recomputed hash.
    HashMismatch,
    /// The entry's `previous_hash` does not match the previous entry's hash.
    LinkMismatch,
    /// The block index sequence has a gap or duplicate.
    IndexGap {
        /// Index the sequence demanded.
        expected: u64,
        /// Index the entry carries.
        found: u64,
    },
    /// The first entry's `previous_hash` is not the genesis constant.
    BadGenesis,
}

impl fmt::Display for ChainIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HashMismatch => write!(f, "stored hash does not match recomputed hash"),
            Self::LinkMismatch => write!(f, "previous_hash does not match predecessor"),
            Self::IndexGap { expected, found } => {
                write!(f, "block index gap: expected {expected}, found {found}")
            },
            Self::BadGenesis => write!(f, "genesis previous_hash is not the zero digest"),
        }
    }
}

/// Outcome of a chain verification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerificationReport {
    /// Whether the whole sequence verified.
    pub ok: bool,
    /// How many entries were checked before stopping.
    pub entries_checked: usize,
    /// First index where verification failed, if any.
    pub first_bad_index: Option<u64>,
    /// What failed at that index.
    pub issue: Option<ChainIssue>,
}

impl ChainVerificationReport {
    fn valid(entries_checked: usize) -> Self {
        Self {
            ok: true,
            entries_checked,
            first_bad_index: None,
            issue: None,
        }
    }

    fn broken(entries_checked: usize, index: u64, issue: ChainIssue) -> Self {
        warn!(block_index = index, %issue, "Audit chain verification failed");
        Self {
            ok: false,
            entries_checked,
            first_bad_index: Some(index),
            issue: Some(issue),
        }
    }
}

/// Verify an ordered sequence of entries starting at genesis.
///
/// Walks the sequence, recomputing every hash from the entry's own fields
/// and checking the link to the predecessor's *stored* hash, and stops at
/// the first index that fails. An empty sequence verifies trivially.
#[must_use]
pub fn verify_chain(entries: &[AuditEntry]) -> ChainVerificationReport {
    verify_from(entries, 0, GENESIS_PREVIOUS_HASH, true)
}

/// Verify a subrange of the chain against an expected predecessor digest.
///
/// Lets a caller spot-check `entries[k..m]` without walking from genesis:
/// `expected_previous` is the stored hash of entry `k-1` (or the genesis
/// constant when the range starts at 0), and `first_index` is the block
/// index the range must start at.
#[must_use]
pub fn verify_subrange(
    entries: &[AuditEntry],
    first_index: u64,
    expected_previous: ContentDigest,
) -> ChainVerificationReport {
    verify_from(entries, first_index, expected_previous, first_index == 0)
}

fn verify_from(
    entries: &[AuditEntry],
    first_index: u64,
    expected_previous: ContentDigest,
    at_genesis: bool,
) -> ChainVerificationReport {
    let mut expected_index = first_index;
    let mut expected_link = expected_previous;

    for (checked, entry) in entries.iter().enumerate() {
        if entry.block_index != expected_index {
            return ChainVerificationReport::broken(
                checked,
                entry.block_index,
                ChainIssue::IndexGap {
                    expected: expected_index,
                    found: entry.block_index,
                },
            );
        }

        if entry.previous_hash != expected_link {
            let issue = if at_genesis && checked == 0 {
                ChainIssue::BadGenesis
            } else {
                ChainIssue::LinkMismatch
            };
            return ChainVerificationReport::broken(checked, entry.block_index, issue);
        }

        if !entry.hash_is_consistent() {
            return ChainVerificationReport::broken(
                checked,
                entry.block_index,
                ChainIssue::HashMismatch,
            );
        }

        expected_link = entry.hash;
        expected_index = expected_index.saturating_add(1);
    }

    ChainVerificationReport::valid(entries.len())
}
