use attest_stake::StakeError;
use attest_types::{ClaimId, ParamsError, ParticipantId, Timestamp};
use thiserror::Error;

use crate::claim::ClaimStatus;

/// Coarse error classes callers can branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Claim, dispute or escrow tag absent.
    NotFound,
    /// Operation attempted outside its legal lifecycle state.
    InvalidState,
    /// Bond or stake below the configured minimum.
    InsufficientStake,
    /// Same participant acting twice.
    DuplicateAction,
    /// Deadline already passed.
    WindowExpired,
    /// Deadline not reached yet.
    WindowNotYetOpen,
    /// The ledger refused a movement of funds.
    Ledger,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("{0} not found")]
    ClaimNotFound(ClaimId),

    #[error("{0} has no active dispute")]
    NoActiveDispute(ClaimId),

    #[error("{claim} is {status:?}, not open for verification")]
    ClaimNotOpen { claim: ClaimId, status: ClaimStatus },

    #[error("{claim} is {status:?}, not resolved")]
    ClaimNotResolved { claim: ClaimId, status: ClaimStatus },

    #[error("{0} has a dispute in progress")]
    DisputeInProgress(ClaimId),

    #[error("{0} has already been settled")]
    AlreadySettled(ClaimId),

    #[error("{0} already has verifications and can no longer be withdrawn")]
    HasVerifications(ClaimId),

    #[error("proposer {0} cannot verify their own claim")]
    SelfVerification(ParticipantId),

    #[error("{0} is a party to the dispute and cannot vote on it")]
    ConflictOfInterest(ParticipantId),

    #[error("{0} is not the proposer of this claim")]
    NotProposer(ParticipantId),

    #[error("verification window is empty or extends past the supported range")]
    InvalidWindow,

    #[error("claim identifiers exhausted")]
    IdsExhausted,

    #[error("insufficient bond: needed {needed}, provided {provided}")]
    InsufficientBond { needed: u128, provided: u128 },

    #[error("stake below minimum: needed {needed}, provided {provided}")]
    StakeBelowMinimum { needed: u128, provided: u128 },

    #[error("{0} has already verified this claim")]
    DuplicateVerification(ParticipantId),

    #[error("{0} is already disputed")]
    AlreadyDisputed(ClaimId),

    #[error("{0} has already voted on this dispute")]
    DuplicateDisputeVote(ParticipantId),

    #[error("window for {claim} closed at {deadline}")]
    WindowClosed { claim: ClaimId, deadline: Timestamp },

    #[error("{claim} cannot be finalized before {deadline} has passed")]
    WindowNotYetOpen { claim: ClaimId, deadline: Timestamp },

    #[error("ledger error: {0}")]
    Ledger(#[from] StakeError),
}

impl VerificationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ClaimNotFound(_) | Self::NoActiveDispute(_) => ErrorKind::NotFound,
            Self::ClaimNotOpen { .. }
            | Self::ClaimNotResolved { .. }
            | Self::DisputeInProgress(_)
            | Self::AlreadySettled(_)
            | Self::HasVerifications(_)
            | Self::SelfVerification(_)
            | Self::ConflictOfInterest(_)
            | Self::NotProposer(_)
            | Self::InvalidWindow
            | Self::IdsExhausted => ErrorKind::InvalidState,
            Self::InsufficientBond { .. } | Self::StakeBelowMinimum { .. } => {
                ErrorKind::InsufficientStake
            }
            Self::DuplicateVerification(_)
            | Self::AlreadyDisputed(_)
            | Self::DuplicateDisputeVote(_) => ErrorKind::DuplicateAction,
            Self::WindowClosed { .. } => ErrorKind::WindowExpired,
            Self::WindowNotYetOpen { .. } => ErrorKind::WindowNotYetOpen,
            Self::Ledger(StakeError::TagNotFound(_)) => ErrorKind::NotFound,
            Self::Ledger(_) => ErrorKind::Ledger,
        }
    }

    /// Snake-case label of the error kind, for counters and logs.
    pub fn kind_label(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::InsufficientStake => "insufficient_stake",
            ErrorKind::DuplicateAction => "duplicate_action",
            ErrorKind::WindowExpired => "window_expired",
            ErrorKind::WindowNotYetOpen => "window_not_yet_open",
            ErrorKind::Ledger => "ledger",
        }
    }
}

/// Failure to persist or rebuild an engine.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Encode(String),

    #[error("snapshot decoding failed: {0}")]
    Decode(String),

    #[error("snapshot carries invalid parameters: {0}")]
    Params(#[from] ParamsError),
}
