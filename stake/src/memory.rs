//! In-memory ledger backed by internal credits.

use crate::error::StakeError;
use crate::ledger::{Ledger, LedgerOp};
use crate::tag::{EscrowEntry, EscrowStatus, StakeTag};
use attest_types::ParticipantId;
use std::collections::{HashMap, HashSet};

/// A complete [`Ledger`] that keeps free balances and escrows in memory.
///
/// Hosts fund accounts with [`InMemoryLedger::credit`]. Settled escrows are
/// kept (with their recipient) so a second release or slash is reported as
/// [`StakeError::AlreadyReleased`] rather than [`StakeError::TagNotFound`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    balances: HashMap<ParticipantId, u128>,
    escrows: HashMap<StakeTag, EscrowEntry>,
    total_escrowed: u128,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add free balance to an account.
    pub fn credit(&mut self, owner: &ParticipantId, amount: u128) -> Result<(), StakeError> {
        let balance = self.balances.entry(owner.clone()).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(StakeError::Overflow)?;
        Ok(())
    }

    /// The full escrow record under `tag`, settled or not.
    pub fn entry(&self, tag: &StakeTag) -> Option<&EscrowEntry> {
        self.escrows.get(tag)
    }

    /// Every escrow that is still held.
    pub fn held(&self) -> impl Iterator<Item = (&StakeTag, &EscrowEntry)> {
        self.escrows.iter().filter(|(_, e)| e.is_held())
    }

    /// Sum of all free balances.
    pub fn total_balance(&self) -> u128 {
        self.balances.values().sum()
    }

    fn held_entry(&self, tag: &StakeTag) -> Result<&EscrowEntry, StakeError> {
        let entry = self
            .escrows
            .get(tag)
            .ok_or_else(|| StakeError::TagNotFound(tag.clone()))?;
        if !entry.is_held() {
            return Err(StakeError::AlreadyReleased(tag.clone()));
        }
        Ok(entry)
    }

    fn settle(&mut self, tag: &StakeTag, to: &ParticipantId, slashed: bool) -> Result<u128, StakeError> {
        let amount = self.held_entry(tag)?.amount;
        let current = self.balance(to);
        let credited = current.checked_add(amount).ok_or(StakeError::Overflow)?;

        self.balances.insert(to.clone(), credited);
        self.total_escrowed -= amount;
        if let Some(entry) = self.escrows.get_mut(tag) {
            entry.status = if slashed {
                EscrowStatus::Slashed { to: to.clone() }
            } else {
                EscrowStatus::Released { to: to.clone() }
            };
        }
        tracing::debug!(tag = %tag, to = %to, amount, slashed, "escrow settled");
        Ok(amount)
    }

    /// Dry-run a batch against staged balances, returning the first failure.
    fn check_batch(&self, ops: &[LedgerOp]) -> Result<(), StakeError> {
        let mut staged: HashMap<&ParticipantId, u128> = HashMap::new();
        let mut settled: HashSet<&StakeTag> = HashSet::new();

        for op in ops {
            match op {
                LedgerOp::Release { tag, to } | LedgerOp::Slash { tag, beneficiary: to } => {
                    let amount = self.held_entry(tag)?.amount;
                    if !settled.insert(tag) {
                        return Err(StakeError::AlreadyReleased(tag.clone()));
                    }
                    let balance = staged.entry(to).or_insert_with(|| self.balance(to));
                    *balance = balance.checked_add(amount).ok_or(StakeError::Overflow)?;
                }
                LedgerOp::Transfer { from, to, amount } => {
                    if *amount == 0 {
                        return Err(StakeError::ZeroAmount);
                    }
                    let available = *staged.entry(from).or_insert_with(|| self.balance(from));
                    if available < *amount {
                        return Err(StakeError::InsufficientBalance {
                            owner: from.clone(),
                            needed: *amount,
                            available,
                        });
                    }
                    staged.insert(from, available - amount);
                    let balance = staged.entry(to).or_insert_with(|| self.balance(to));
                    *balance = balance.checked_add(*amount).ok_or(StakeError::Overflow)?;
                }
            }
        }
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn escrow(
        &mut self,
        owner: &ParticipantId,
        amount: u128,
        tag: StakeTag,
    ) -> Result<(), StakeError> {
        if amount == 0 {
            return Err(StakeError::ZeroAmount);
        }
        if self.escrows.contains_key(&tag) {
            return Err(StakeError::DuplicateTag(tag));
        }
        let available = self.balance(owner);
        if available < amount {
            return Err(StakeError::InsufficientBalance {
                owner: owner.clone(),
                needed: amount,
                available,
            });
        }
        let total = self
            .total_escrowed
            .checked_add(amount)
            .ok_or(StakeError::Overflow)?;

        self.balances.insert(owner.clone(), available - amount);
        self.total_escrowed = total;
        tracing::debug!(tag = %tag, owner = %owner, amount, "escrowed");
        self.escrows.insert(
            tag,
            EscrowEntry {
                owner: owner.clone(),
                amount,
                status: EscrowStatus::Held,
            },
        );
        Ok(())
    }

    fn release(&mut self, tag: &StakeTag, to: &ParticipantId) -> Result<u128, StakeError> {
        self.settle(tag, to, false)
    }

    fn slash(&mut self, tag: &StakeTag, beneficiary: &ParticipantId) -> Result<u128, StakeError> {
        self.settle(tag, beneficiary, true)
    }

    fn transfer(
        &mut self,
        from: &ParticipantId,
        to: &ParticipantId,
        amount: u128,
    ) -> Result<(), StakeError> {
        self.check_batch(&[LedgerOp::Transfer {
            from: from.clone(),
            to: to.clone(),
            amount,
        }])?;
        let from_balance = self.balance(from);
        self.balances.insert(from.clone(), from_balance - amount);
        let to_balance = self.balance(to);
        self.balances.insert(to.clone(), to_balance + amount);
        Ok(())
    }

    fn apply(&mut self, ops: &[LedgerOp]) -> Result<(), StakeError> {
        self.check_batch(ops)?;
        for op in ops {
            match op {
                LedgerOp::Release { tag, to } => {
                    self.release(tag, to)?;
                }
                LedgerOp::Slash { tag, beneficiary } => {
                    self.slash(tag, beneficiary)?;
                }
                LedgerOp::Transfer { from, to, amount } => {
                    self.transfer(from, to, *amount)?;
                }
            }
        }
        Ok(())
    }

    fn balance(&self, owner: &ParticipantId) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn escrowed(&self, tag: &StakeTag) -> Option<u128> {
        self.escrows
            .get(tag)
            .filter(|e| e.is_held())
            .map(|e| e.amount)
    }

    fn total_escrowed(&self) -> u128 {
        self.total_escrowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::StakeRole;
    use attest_types::ClaimId;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    fn funded(owner: &str, amount: u128) -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new();
        ledger.credit(&pid(owner), amount).unwrap();
        ledger
    }

    fn tag(owner: &str) -> StakeTag {
        StakeTag::new(ClaimId::new(1), pid(owner), StakeRole::Verification)
    }

    #[test]
    fn escrow_then_release_round_trips() {
        let mut ledger = funded("alice", 500);
        ledger.escrow(&pid("alice"), 200, tag("alice")).unwrap();
        assert_eq!(ledger.balance(&pid("alice")), 300);
        assert_eq!(ledger.total_escrowed(), 200);

        let amount = ledger.release(&tag("alice"), &pid("alice")).unwrap();
        assert_eq!(amount, 200);
        assert_eq!(ledger.balance(&pid("alice")), 500);
        assert_eq!(ledger.total_escrowed(), 0);

        assert_eq!(
            ledger.release(&tag("alice"), &pid("alice")),
            Err(StakeError::AlreadyReleased(tag("alice")))
        );
        assert_eq!(
            ledger.slash(&tag("alice"), &pid("pool")),
            Err(StakeError::AlreadyReleased(tag("alice")))
        );
    }

    #[test]
    fn unknown_tag_is_not_found() {
        let mut ledger = InMemoryLedger::new();
        assert_eq!(
            ledger.release(&tag("nobody"), &pid("nobody")),
            Err(StakeError::TagNotFound(tag("nobody")))
        );
    }

    #[test]
    fn slash_pays_beneficiary() {
        let mut ledger = funded("alice", 100);
        ledger.escrow(&pid("alice"), 100, tag("alice")).unwrap();
        ledger.slash(&tag("alice"), &pid("pool")).unwrap();
        assert_eq!(ledger.balance(&pid("alice")), 0);
        assert_eq!(ledger.balance(&pid("pool")), 100);
        assert_eq!(
            ledger.entry(&tag("alice")).unwrap().status,
            EscrowStatus::Slashed { to: pid("pool") }
        );
    }

    #[test]
    fn escrow_rejects_zero_duplicate_and_overdraft() {
        let mut ledger = funded("alice", 100);
        assert_eq!(
            ledger.escrow(&pid("alice"), 0, tag("alice")),
            Err(StakeError::ZeroAmount)
        );
        assert!(matches!(
            ledger.escrow(&pid("alice"), 101, tag("alice")),
            Err(StakeError::InsufficientBalance { needed: 101, available: 100, .. })
        ));
        ledger.escrow(&pid("alice"), 50, tag("alice")).unwrap();
        assert_eq!(
            ledger.escrow(&pid("alice"), 10, tag("alice")),
            Err(StakeError::DuplicateTag(tag("alice")))
        );
        assert_eq!(ledger.balance(&pid("alice")), 50);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut ledger = funded("alice", 100);
        ledger.credit(&pid("bob"), 100).unwrap();
        ledger.escrow(&pid("alice"), 100, tag("alice")).unwrap();
        ledger.escrow(&pid("bob"), 100, tag("bob")).unwrap();

        // Paying out more than the pool will hold fails the whole batch.
        let ops = vec![
            LedgerOp::Release { tag: tag("alice"), to: pid("alice") },
            LedgerOp::Slash { tag: tag("bob"), beneficiary: pid("pool") },
            LedgerOp::Transfer { from: pid("pool"), to: pid("alice"), amount: 150 },
        ];
        assert!(matches!(
            ledger.apply(&ops),
            Err(StakeError::InsufficientBalance { needed: 150, available: 100, .. })
        ));
        assert_eq!(ledger.total_escrowed(), 200);
        assert_eq!(ledger.balance(&pid("alice")), 0);
        assert_eq!(ledger.balance(&pid("pool")), 0);

        let ops = vec![
            LedgerOp::Release { tag: tag("alice"), to: pid("alice") },
            LedgerOp::Slash { tag: tag("bob"), beneficiary: pid("pool") },
            LedgerOp::Transfer { from: pid("pool"), to: pid("alice"), amount: 90 },
        ];
        ledger.apply(&ops).unwrap();
        assert_eq!(ledger.balance(&pid("alice")), 190);
        assert_eq!(ledger.balance(&pid("pool")), 10);
        assert_eq!(ledger.total_escrowed(), 0);
    }

    #[test]
    fn batch_rejects_settling_a_tag_twice() {
        let mut ledger = funded("alice", 100);
        ledger.escrow(&pid("alice"), 100, tag("alice")).unwrap();
        let ops = vec![
            LedgerOp::Release { tag: tag("alice"), to: pid("alice") },
            LedgerOp::Slash { tag: tag("alice"), beneficiary: pid("pool") },
        ];
        assert_eq!(
            ledger.apply(&ops),
            Err(StakeError::AlreadyReleased(tag("alice")))
        );
        assert_eq!(ledger.escrowed(&tag("alice")), Some(100));
    }
}
