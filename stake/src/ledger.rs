//! The ledger seam between the engine and the host's asset system.

use crate::error::StakeError;
use crate::tag::StakeTag;
use attest_types::ParticipantId;
use serde::{Deserialize, Serialize};

/// One movement inside a settlement batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOp {
    /// Return the escrowed amount under `tag` to `to`.
    Release { tag: StakeTag, to: ParticipantId },
    /// Forfeit the escrowed amount under `tag` to `beneficiary`.
    Slash {
        tag: StakeTag,
        beneficiary: ParticipantId,
    },
    /// Move free balance between accounts.
    Transfer {
        from: ParticipantId,
        to: ParticipantId,
        amount: u128,
    },
}

/// Escrow accounting backed by whatever asset system the host uses.
///
/// Implementations must never settle a tag twice and must keep
/// [`Ledger::total_escrowed`] equal to the sum of all held escrows.
pub trait Ledger {
    /// Lock `amount` of `owner`'s funds under `tag`.
    fn escrow(&mut self, owner: &ParticipantId, amount: u128, tag: StakeTag)
        -> Result<(), StakeError>;

    /// Pay the full escrowed amount under `tag` to `to`. Returns the amount.
    fn release(&mut self, tag: &StakeTag, to: &ParticipantId) -> Result<u128, StakeError>;

    /// Forfeit the full escrowed amount under `tag` to `beneficiary`. Returns the amount.
    fn slash(&mut self, tag: &StakeTag, beneficiary: &ParticipantId) -> Result<u128, StakeError>;

    /// Move free balance from one account to another.
    fn transfer(
        &mut self,
        from: &ParticipantId,
        to: &ParticipantId,
        amount: u128,
    ) -> Result<(), StakeError>;

    /// Apply a batch of operations atomically: either every operation takes
    /// effect, or none does and the first failure is returned.
    fn apply(&mut self, ops: &[LedgerOp]) -> Result<(), StakeError>;

    /// Free (unescrowed) balance of `owner`.
    fn balance(&self, owner: &ParticipantId) -> u128;

    /// Amount still held under `tag`, if the tag exists and is unsettled.
    fn escrowed(&self, tag: &StakeTag) -> Option<u128>;

    /// Sum of every unsettled escrow.
    fn total_escrowed(&self) -> u128;
}
