//! Per-participant reputation record.

use attest_types::{ParticipantId, Timestamp};
use serde::{Deserialize, Serialize};

/// Reputation state for a single participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub id: ParticipantId,
    pub reputation: i64,
    /// Point from which pending decay is measured.
    pub last_decay: Timestamp,
}

impl ParticipantRecord {
    pub fn new(id: ParticipantId, reputation: i64, now: Timestamp) -> Self {
        Self {
            id,
            reputation,
            last_decay: now,
        }
    }
}

/// The effect of an explicit adjustment, reported to event consumers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationChange {
    pub participant: ParticipantId,
    /// Score after pending decay, before the delta.
    pub before: i64,
    /// Score after the delta and clamping.
    pub after: i64,
}

impl ReputationChange {
    /// Net change actually applied (may differ from the requested delta when clamped).
    pub fn applied_delta(&self) -> i64 {
        self.after - self.before
    }
}
