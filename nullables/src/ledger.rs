//! Nullable ledger: an in-memory ledger that fails on command.

use attest_stake::{InMemoryLedger, Ledger, LedgerOp, StakeError, StakeTag};
use attest_types::ParticipantId;

/// Wraps [`InMemoryLedger`] and injects failures into mutating calls.
///
/// Failures can be armed for the next call (`fail_next`) or for every call
/// after a number of successes (`fail_after`). Failed calls change nothing.
#[derive(Clone, Debug, Default)]
pub struct NullLedger {
    inner: InMemoryLedger,
    fail_next: bool,
    succeed_remaining: Option<usize>,
    calls: usize,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balances<'a>(balances: impl IntoIterator<Item = (&'a str, u128)>) -> Self {
        let mut ledger = Self::new();
        for (owner, amount) in balances {
            let _ = ledger.inner.credit(&ParticipantId::new(owner), amount);
        }
        ledger
    }

    pub fn credit(&mut self, owner: &ParticipantId, amount: u128) -> Result<(), StakeError> {
        self.inner.credit(owner, amount)
    }

    /// Fail the next mutating call.
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }

    /// Allow `successes` more mutating calls, then fail every one after.
    pub fn fail_after(&mut self, successes: usize) {
        self.succeed_remaining = Some(successes);
    }

    /// Stop injecting failures.
    pub fn heal(&mut self) {
        self.fail_next = false;
        self.succeed_remaining = None;
    }

    /// Mutating calls attempted so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn inner(&self) -> &InMemoryLedger {
        &self.inner
    }

    fn check(&mut self) -> Result<(), StakeError> {
        self.calls += 1;
        if std::mem::take(&mut self.fail_next) {
            return Err(StakeError::Other("injected failure".into()));
        }
        match self.succeed_remaining.as_mut() {
            Some(0) => Err(StakeError::Other("injected failure".into())),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Ledger for NullLedger {
    fn escrow(&mut self, owner: &ParticipantId, amount: u128, tag: StakeTag) -> Result<(), StakeError> {
        self.check()?;
        self.inner.escrow(owner, amount, tag)
    }

    fn release(&mut self, tag: &StakeTag, to: &ParticipantId) -> Result<u128, StakeError> {
        self.check()?;
        self.inner.release(tag, to)
    }

    fn slash(&mut self, tag: &StakeTag, beneficiary: &ParticipantId) -> Result<u128, StakeError> {
        self.check()?;
        self.inner.slash(tag, beneficiary)
    }

    fn transfer(&mut self, from: &ParticipantId, to: &ParticipantId, amount: u128) -> Result<(), StakeError> {
        self.check()?;
        self.inner.transfer(from, to, amount)
    }

    fn apply(&mut self, ops: &[LedgerOp]) -> Result<(), StakeError> {
        self.check()?;
        self.inner.apply(ops)
    }

    fn balance(&self, owner: &ParticipantId) -> u128 {
        self.inner.balance(owner)
    }

    fn escrowed(&self, tag: &StakeTag) -> Option<u128> {
        self.inner.escrowed(tag)
    }

    fn total_escrowed(&self) -> u128 {
        self.inner.total_escrowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_types::ClaimId;

    fn alice() -> ParticipantId {
        ParticipantId::new("alice")
    }

    #[test]
    fn fail_next_fails_once() {
        let mut ledger = NullLedger::with_balances([("alice", 100)]);
        let tag = StakeTag::bond(ClaimId::new(1), &alice());
        ledger.fail_next();
        assert!(matches!(ledger.escrow(&alice(), 10, tag.clone()), Err(StakeError::Other(_))));
        assert_eq!(ledger.balance(&alice()), 100);
        ledger.escrow(&alice(), 10, tag).unwrap();
        assert_eq!(ledger.calls(), 2);
    }

    #[test]
    fn fail_after_counts_successes() {
        let mut ledger = NullLedger::with_balances([("alice", 100)]);
        ledger.fail_after(1);
        ledger.escrow(&alice(), 10, StakeTag::bond(ClaimId::new(1), &alice())).unwrap();
        assert!(ledger.escrow(&alice(), 10, StakeTag::bond(ClaimId::new(2), &alice())).is_err());
        assert!(ledger.escrow(&alice(), 10, StakeTag::bond(ClaimId::new(3), &alice())).is_err());
        ledger.heal();
        ledger.escrow(&alice(), 10, StakeTag::bond(ClaimId::new(4), &alice())).unwrap();
        assert_eq!(ledger.total_escrowed(), 20);
    }
}
