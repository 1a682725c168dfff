use proptest::prelude::*;

use attest_stake::{InMemoryLedger, Ledger, StakeRole, StakeTag};
use attest_types::{ClaimId, ParticipantId};

#[derive(Clone, Debug)]
enum Action {
    Escrow { owner: u8, claim: u8, amount: u128 },
    Release { owner: u8, claim: u8, to: u8 },
    Slash { owner: u8, claim: u8 },
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0u8..4, 0u8..4, 0u128..300).prop_map(|(owner, claim, amount)| Action::Escrow {
            owner,
            claim,
            amount
        }),
        (0u8..4, 0u8..4, 0u8..4).prop_map(|(owner, claim, to)| Action::Release { owner, claim, to }),
        (0u8..4, 0u8..4).prop_map(|(owner, claim)| Action::Slash { owner, claim }),
    ]
}

fn pid(i: u8) -> ParticipantId {
    ParticipantId::new(format!("p{i}"))
}

fn tag(owner: u8, claim: u8) -> StakeTag {
    StakeTag::new(ClaimId::new(claim as u64), pid(owner), StakeRole::Verification)
}

proptest! {
    /// Whatever succeeds or fails, money is conserved and the escrow total
    /// equals the sum of held escrows.
    #[test]
    fn ledger_conserves_funds(actions in prop::collection::vec(action(), 1..80)) {
        let mut ledger = InMemoryLedger::new();
        for i in 0..4 {
            ledger.credit(&pid(i), 1_000).unwrap();
        }
        let pool = ParticipantId::new("pool");
        let supply = 4_000u128;

        for action in actions {
            let _ = match action {
                Action::Escrow { owner, claim, amount } => {
                    ledger.escrow(&pid(owner), amount, tag(owner, claim)).map(|_| 0)
                }
                Action::Release { owner, claim, to } => ledger.release(&tag(owner, claim), &pid(to)),
                Action::Slash { owner, claim } => ledger.slash(&tag(owner, claim), &pool),
            };

            let held: u128 = ledger.held().map(|(_, e)| e.amount).sum();
            prop_assert_eq!(ledger.total_escrowed(), held);
            prop_assert_eq!(ledger.total_balance() + ledger.total_escrowed(), supply);
        }
    }

    /// A tag settles exactly once.
    #[test]
    fn tags_settle_once(amount in 1u128..1_000, slash_first in any::<bool>()) {
        let mut ledger = InMemoryLedger::new();
        ledger.credit(&pid(0), 1_000).unwrap();
        ledger.escrow(&pid(0), amount, tag(0, 1)).unwrap();

        let pool = ParticipantId::new("pool");
        if slash_first {
            prop_assert_eq!(ledger.slash(&tag(0, 1), &pool), Ok(amount));
        } else {
            prop_assert_eq!(ledger.release(&tag(0, 1), &pid(0)), Ok(amount));
        }
        prop_assert!(ledger.release(&tag(0, 1), &pid(0)).is_err());
        prop_assert!(ledger.slash(&tag(0, 1), &pool).is_err());
        prop_assert_eq!(ledger.escrowed(&tag(0, 1)), None);
    }
}
