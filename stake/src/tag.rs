//! Escrow tags and records.

use attest_types::{ClaimId, ParticipantId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a participant escrowed funds against a claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StakeRole {
    /// Bond posted by the proposer.
    Bond,
    /// Stake attached to a verification.
    Verification,
    /// Stake posted by a disputer.
    Dispute,
}

impl StakeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bond => "bond",
            Self::Verification => "verification",
            Self::Dispute => "dispute",
        }
    }
}

/// Key of a single escrow: one per (claim, participant, role).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StakeTag {
    pub claim: ClaimId,
    pub participant: ParticipantId,
    pub role: StakeRole,
}

impl StakeTag {
    pub fn new(claim: ClaimId, participant: ParticipantId, role: StakeRole) -> Self {
        Self {
            claim,
            participant,
            role,
        }
    }

    pub fn bond(claim: ClaimId, proposer: &ParticipantId) -> Self {
        Self::new(claim, proposer.clone(), StakeRole::Bond)
    }

    pub fn verification(claim: ClaimId, verifier: &ParticipantId) -> Self {
        Self::new(claim, verifier.clone(), StakeRole::Verification)
    }

    pub fn dispute(claim: ClaimId, disputer: &ParticipantId) -> Self {
        Self::new(claim, disputer.clone(), StakeRole::Dispute)
    }
}

impl fmt::Display for StakeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.claim, self.participant, self.role.as_str())
    }
}

/// Where an escrow stands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowStatus {
    Held,
    Released { to: ParticipantId },
    Slashed { to: ParticipantId },
}

/// A recorded escrow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowEntry {
    pub owner: ParticipantId,
    pub amount: u128,
    pub status: EscrowStatus,
}

impl EscrowEntry {
    pub fn is_held(&self) -> bool {
        self.status == EscrowStatus::Held
    }
}
