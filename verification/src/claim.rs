//! Claim records and their lifecycle states.

use crate::consensus::{weighted_score, Ratio};
use crate::dispute::Dispute;
use attest_types::{ClaimId, ParticipantId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Accepting verifications until the verification deadline.
    PendingVerification,
    /// A resolved outcome is being challenged.
    Disputed,
    ResolvedTrue,
    ResolvedFalse,
    /// Inconclusive consensus, or withdrawn by the proposer. Everything refunded.
    Canceled,
    /// Too few verifications to resolve. Everything refunded.
    Expired,
}

impl ClaimStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::ResolvedTrue | Self::ResolvedFalse)
    }

    /// The asserted truth value, for resolved states.
    pub fn outcome(&self) -> Option<bool> {
        match self {
            Self::ResolvedTrue => Some(true),
            Self::ResolvedFalse => Some(false),
            _ => None,
        }
    }

    pub fn resolved(outcome: bool) -> Self {
        if outcome {
            Self::ResolvedTrue
        } else {
            Self::ResolvedFalse
        }
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self, next),
            (PendingVerification, ResolvedTrue | ResolvedFalse | Canceled | Expired)
                | (ResolvedTrue | ResolvedFalse, Disputed)
                | (Disputed, ResolvedTrue | ResolvedFalse)
        )
    }
}

/// Outcome of the verification phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    True,
    False,
    Canceled,
    Expired,
}

impl Resolution {
    pub fn status(&self) -> ClaimStatus {
        match self {
            Self::True => ClaimStatus::ResolvedTrue,
            Self::False => ClaimStatus::ResolvedFalse,
            Self::Canceled => ClaimStatus::Canceled,
            Self::Expired => ClaimStatus::Expired,
        }
    }

    pub fn outcome(&self) -> Option<bool> {
        self.status().outcome()
    }
}

/// A staked vote on a claim's truth value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub verifier: ParticipantId,
    pub asserted: bool,
    pub stake: u128,
    /// Reputation weight captured when the vote was recorded.
    pub weight: u128,
    pub recorded_at: Timestamp,
}

/// An assertion submitted for verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub proposer: ParticipantId,
    pub payload: String,
    pub bond: u128,
    pub status: ClaimStatus,
    pub created_at: Timestamp,
    pub verification_deadline: Timestamp,
    /// Set once the claim resolves True or False.
    pub dispute_deadline: Option<Timestamp>,
    pub true_weight: u128,
    pub false_weight: u128,
    pub verifications: Vec<Verification>,
    /// Position of each verifier's entry in `verifications`.
    pub verifier_index: BTreeMap<ParticipantId, usize>,
    /// Outcome of the verification phase, once finalized.
    pub resolution: Option<Resolution>,
    pub dispute: Option<Dispute>,
    /// Every escrow tied to the claim has been released or slashed.
    pub settled: bool,
}

impl Claim {
    pub fn total_weight(&self) -> u128 {
        self.true_weight.saturating_add(self.false_weight)
    }

    pub fn score(&self) -> Ratio {
        weighted_score(self.true_weight, self.false_weight)
    }

    pub fn verification_by(&self, verifier: &ParticipantId) -> Option<&Verification> {
        self.verifier_index
            .get(verifier)
            .and_then(|&at| self.verifications.get(at))
    }

    pub fn has_verified(&self, verifier: &ParticipantId) -> bool {
        self.verifier_index.contains_key(verifier)
    }

    /// Append a verification, keeping the weight totals and the verifier
    /// index in step.
    pub(crate) fn record_verification(&mut self, verification: Verification) {
        if verification.asserted {
            self.true_weight = self.true_weight.saturating_add(verification.weight);
        } else {
            self.false_weight = self.false_weight.saturating_add(verification.weight);
        }
        self.verifier_index
            .insert(verification.verifier.clone(), self.verifications.len());
        self.verifications.push(verification);
    }
}
