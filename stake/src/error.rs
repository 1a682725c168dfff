//! Stake ledger errors.

use crate::tag::StakeTag;
use attest_types::ParticipantId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StakeError {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("no escrow recorded under {0}")]
    TagNotFound(StakeTag),

    #[error("escrow {0} has already been released or slashed")]
    AlreadyReleased(StakeTag),

    #[error("an escrow is already recorded under {0}")]
    DuplicateTag(StakeTag),

    #[error("insufficient balance for {owner}: need {needed}, available {available}")]
    InsufficientBalance {
        owner: ParticipantId,
        needed: u128,
        available: u128,
    },

    #[error("arithmetic overflow in ledger balance")]
    Overflow,

    #[error("{0}")]
    Other(String),
}
